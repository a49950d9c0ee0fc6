// src/task/params.rs

//! Parameters of each task kind, as written in `[task.<name>]` sections.
//!
//! Paths may be relative; handlers resolve them against the invocation
//! context's working directory at run time.

use std::path::PathBuf;

use serde::Deserialize;

/// `kind = "acc_compile"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccCompileTask {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Keep `acs.err` after reading it instead of deleting it.
    #[serde(default)]
    pub keep_error_file: bool,
}

/// `kind = "bcc_compile"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BccCompileTask {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// `kind = "gdcc_acc_compile"` and `kind = "gdcc_cc_compile"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GdccCompileTask {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    /// Bytecode target passed as `--bc-target` (e.g. `"ZDoom"`).
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// `kind = "gdcc_link"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GdccLinkTask {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// `kind = "gdcc_make_lib"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GdccMakeLibTask {
    pub output: PathBuf,
    /// Library names to build (e.g. `["libc", "libGDCC"]`); empty = tool default.
    #[serde(default)]
    pub libraries: Vec<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// `kind = "gdcc_build"`: gdcc-cc every source, then gdcc-ld the objects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GdccBuildTask {
    pub sources: Vec<PathBuf>,
    pub output: PathBuf,
    /// Where intermediate `.ir` objects go; defaults to the output's directory.
    #[serde(default)]
    pub object_dir: Option<PathBuf>,
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub cc_args: Vec<String>,
    #[serde(default)]
    pub ld_args: Vec<String>,
}

/// `kind = "run_in_vm"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunInVmTask {
    pub input: PathBuf,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// `kind = "copy_file"` and `kind = "move_file"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileTransferTask {
    pub source: PathBuf,
    pub target: PathBuf,
    #[serde(default)]
    pub overwrite: bool,
}

/// `kind = "delete_file"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteFileTask {
    pub path: PathBuf,
}

/// `kind = "copy_project"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CopyProjectTask {
    pub target: PathBuf,
    /// Glob patterns (relative to the project directory) left out of the copy.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Point the working directory of all following tasks at the copy.
    #[serde(default = "default_true")]
    pub set_working_directory: bool,
}

/// `kind = "zip_folder"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZipFolderTask {
    pub folder: PathBuf,
    pub output: PathBuf,
    /// Glob patterns (relative to `folder`) left out of the archive.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_true() -> bool {
    true
}
