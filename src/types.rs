// src/types.rs

use std::fmt;

use serde::Deserialize;

/// What the orchestrator does when a task inside a profile fails.
///
/// This belongs to the *profile entry*, not to the task definition: the same
/// task can halt one profile and be best-effort in another.
///
/// - `StopOnError` (default): mark the profile as failed and leave all later
///   tasks `Pending`.
/// - `DontStop`: record the failure on the task and continue with the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorBehavior {
    DontStop,
    StopOnError,
}

impl Default for ErrorBehavior {
    fn default() -> Self {
        ErrorBehavior::StopOnError
    }
}

impl fmt::Display for ErrorBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBehavior::DontStop => f.write_str("dont_stop"),
            ErrorBehavior::StopOnError => f.write_str("stop_on_error"),
        }
    }
}

/// Status of a profile run or of a single task within it.
///
/// Transitions are monotonic: `Pending -> Running -> {Success, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Success,
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        };
        f.write_str(s)
    }
}
