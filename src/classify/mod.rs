// src/classify/mod.rs

//! Compiler output classifiers.
//!
//! Every compiler family reports failures through a different channel:
//!
//! - [`acc`]: exit code plus an `acs.err` side-file next to the input.
//! - [`bcc`]: exit code plus whatever ended up on stderr.
//! - [`gdcc`]: exit code plus `WARNING: ` / `ERROR: ` prefixed stderr lines.
//!
//! Shared rule: a failed exit code always yields an `Error` result, with a
//! generic message when the tool gave no usable detail.

pub mod acc;
pub mod bcc;
pub mod gdcc;

use crate::result::{ProcessInvocationResult, TaskInvocationResult};

/// Generic failure text for `tool` when nothing better is available.
pub fn unknown_failure(tool: &str) -> String {
    format!("{tool} failed for an unknown reason")
}

/// Map a launch/await failure to a task result, keeping cancellation
/// distinguishable from a broken tool.
///
/// Returns `None` if the process ran normally.
pub fn launch_failure(tool: &str, result: &ProcessInvocationResult) -> Option<TaskInvocationResult> {
    let exception = result.exception.as_ref()?;
    let failed = TaskInvocationResult::from_exception(
        format!("{tool} could not be run: {exception}"),
        exception.clone(),
    );
    if failed.is_cancelled() {
        Some(TaskInvocationResult::cancelled())
    } else {
        Some(failed)
    }
}
