// src/result/process.rs

use crate::result::TaskException;

/// Outcome of one external process invocation.
///
/// Exactly one of the two situations applies:
/// - the process ran and (normally) produced an exit code, or
/// - starting / awaiting it failed and `exception` is set.
#[derive(Debug, Clone, Default)]
pub struct ProcessInvocationResult {
    /// `None` if the process never reported an exit code (launch failure,
    /// killed by a signal, cancelled).
    pub exit_code: Option<i32>,
    pub exception: Option<TaskException>,
}

impl ProcessInvocationResult {
    pub fn exited(code: Option<i32>) -> Self {
        Self {
            exit_code: code,
            exception: None,
        }
    }

    pub fn failed(err: anyhow::Error) -> Self {
        Self {
            exit_code: None,
            exception: Some(TaskException::new(err)),
        }
    }

    /// True whenever the exit code is anything but `Some(0)`.
    ///
    /// A missing exit code counts as a failure: a process we could not
    /// observe finishing cleanly is never reported as a successful build.
    pub fn has_compiler_error(&self) -> bool {
        self.exit_code != Some(0)
    }

    /// True if the process could not be started or awaited.
    pub fn is_launch_failure(&self) -> bool {
        self.exception.is_some()
    }
}
