// src/classify/acc.rs

//! ACC reports compile errors by writing `acs.err` into the directory of the
//! input file.
//!
//! Before a run, a stale side-file is moved out of the way so ACC does not
//! refuse to overwrite it and an old error is never attributed to this run.
//! After a failed run the side-file's content is the error text.
//!
//! Two runs compiling files from the same directory at the same time race on
//! the side-file; nothing here serialises them.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use crate::classify::{launch_failure, unknown_failure};
use crate::fs::FileSystem;
use crate::result::{ProcessInvocationResult, TaskInvocationResult};

pub const ERROR_FILE_NAME: &str = "acs.err";

const TOOL: &str = "ACC";

/// Location of the side-file ACC writes for `input`.
pub fn error_file_path(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) => dir.join(ERROR_FILE_NAME),
        None => PathBuf::from(ERROR_FILE_NAME),
    }
}

/// Rename an existing side-file to a timestamped backup next to it.
///
/// Returns the backup path, or `None` if there was nothing to move. The
/// backup name is `acs.<yyyymmdd-hhmmss>.err`, with an index appended when
/// that name is already taken.
pub fn backup_error_file(fs: &dyn FileSystem, error_file: &Path) -> Result<Option<PathBuf>> {
    if !fs.exists(error_file) {
        return Ok(None);
    }

    let dir = error_file.parent().unwrap_or_else(|| Path::new(""));
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();

    let mut backup = dir.join(format!("acs.{stamp}.err"));
    let mut index = 1;
    while fs.exists(&backup) {
        backup = dir.join(format!("acs.{stamp}.{index}.err"));
        index += 1;
    }

    fs.rename(error_file, &backup)?;
    info!(
        from = %error_file.display(),
        to = %backup.display(),
        "moved stale ACC error file out of the way"
    );
    Ok(Some(backup))
}

/// Read the side-file produced by this run (if any), then delete it unless
/// `keep` is set.
pub fn collect_error_file(fs: &dyn FileSystem, error_file: &Path, keep: bool) -> Option<String> {
    if !fs.is_file(error_file) {
        return None;
    }

    let content = match fs.read_to_string(error_file) {
        Ok(content) => Some(content),
        Err(err) => {
            warn!(file = %error_file.display(), error = %err, "failed to read ACC error file");
            None
        }
    };

    if !keep {
        if let Err(err) = fs.remove_file(error_file) {
            warn!(file = %error_file.display(), error = %err, "failed to delete ACC error file");
        }
    }

    content
}

/// Classify an ACC run from its process result and the side-file content.
pub fn classify(result: &ProcessInvocationResult, error_text: Option<&str>) -> TaskInvocationResult {
    if let Some(failed) = launch_failure(TOOL, result) {
        return failed;
    }

    if !result.has_compiler_error() {
        return TaskInvocationResult::success("ACC compiled successfully");
    }

    match error_text.map(str::trim_end).filter(|t| !t.trim().is_empty()) {
        Some(text) => TaskInvocationResult::failure(text),
        None => TaskInvocationResult::failure(unknown_failure(TOOL)),
    }
}
