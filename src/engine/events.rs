// src/engine/events.rs

use crate::result::OutputLine;
use crate::types::RunStatus;

/// Progress notifications published while a profile runs.
///
/// Events arrive in profile order: `ProfileStarted`, then for each task that
/// runs a `Running` status change, its output lines, and its terminal status
/// change, and finally `ProfileFinished`.
#[derive(Debug, Clone)]
pub enum RunEvent {
    ProfileStarted {
        profile: String,
        task_count: usize,
    },
    TaskStatusChanged {
        index: usize,
        task: String,
        status: RunStatus,
    },
    OutputLine {
        index: usize,
        line: OutputLine,
    },
    ProfileFinished {
        profile: String,
        status: RunStatus,
        elapsed_ms: u64,
    },
}
