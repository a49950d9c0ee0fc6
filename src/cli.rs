// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `acsbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "acsbuild",
    version,
    about = "Run ACS / GDCC build profiles defined in a project file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project file (TOML).
    #[arg(long, value_name = "PATH", default_value = "acsbuild.toml")]
    pub project: String,

    /// Profile to run.
    #[arg(long, value_name = "NAME", required_unless_present = "list")]
    pub profile: Option<String>,

    /// List tasks and profiles of the project, then exit.
    #[arg(long)]
    pub list: bool,

    /// Validate the profile's tasks and exit without running anything.
    #[arg(long)]
    pub validate_only: bool,

    /// Print the tasks the profile would run, in order, without running them.
    #[arg(long)]
    pub dry_run: bool,

    /// Run even if validation reported errors.
    #[arg(long)]
    pub force: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ACSBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
