// src/classify/bcc.rs

//! BCC (and the ACS VM) report failures as free text on stderr.

use crate::classify::{launch_failure, unknown_failure};
use crate::result::{ProcessInvocationResult, TaskInvocationResult};

const TOOL: &str = "BCC";

pub fn classify(result: &ProcessInvocationResult, stderr: &str) -> TaskInvocationResult {
    classify_stderr(TOOL, result, stderr)
}

/// Exit code decides the outcome; stderr supplies the detail.
///
/// - failed exit: the whole trimmed stderr text is the error, or a generic
///   message if stderr is empty.
/// - clean exit: success; any stderr lines are kept as warnings.
pub fn classify_stderr(
    tool: &str,
    result: &ProcessInvocationResult,
    stderr: &str,
) -> TaskInvocationResult {
    if let Some(failed) = launch_failure(tool, result) {
        return failed;
    }

    let text = stderr.trim();

    if result.has_compiler_error() {
        if text.is_empty() {
            return TaskInvocationResult::failure(unknown_failure(tool));
        }
        return TaskInvocationResult::failure(text);
    }

    let warnings: Vec<String> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    TaskInvocationResult::success(format!("{tool} finished successfully")).with_warnings(warnings)
}
