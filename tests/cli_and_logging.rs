use clap::Parser;
use tracing::Level;

use acsbuild::cli::{CliArgs, LogLevel};
use acsbuild::logging::{parse_level_str, resolve_level};

#[test]
fn test_cli_flag_beats_environment() {
    assert_eq!(resolve_level(Some(LogLevel::Trace), Some("error")), Level::TRACE);
    assert_eq!(resolve_level(Some(LogLevel::Warn), None), Level::WARN);
}

#[test]
fn test_environment_is_used_when_parseable() {
    assert_eq!(resolve_level(None, Some(" Debug ")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some("warning")), Level::WARN);
    assert_eq!(resolve_level(None, Some("loud")), Level::INFO);
    assert_eq!(resolve_level(None, None), Level::INFO);
}

#[test]
fn test_parse_level_str_rejects_unknown() {
    assert_eq!(parse_level_str("TRACE"), Some(Level::TRACE));
    assert_eq!(parse_level_str(""), None);
}

#[test]
fn test_profile_is_required_unless_listing() {
    assert!(CliArgs::try_parse_from(["acsbuild"]).is_err());

    let list = CliArgs::try_parse_from(["acsbuild", "--list"]).expect("--list alone is fine");
    assert!(list.list);
    assert_eq!(list.project, "acsbuild.toml");

    let args = CliArgs::try_parse_from([
        "acsbuild",
        "--project",
        "mod/acsbuild.toml",
        "--profile",
        "release",
        "--dry-run",
        "--log-level",
        "debug",
    ])
    .expect("valid arguments");
    assert_eq!(args.profile.as_deref(), Some("release"));
    assert_eq!(args.project, "mod/acsbuild.toml");
    assert!(args.dry_run);
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
}
