// src/engine/run_state.rs

//! Profiles and their per-run mutable state.

use std::sync::Arc;

use crate::result::{ResultType, TaskException, TaskInvocationResult};
use crate::task::{OutputLog, Runnable, TaskDefinition};
use crate::types::{ErrorBehavior, RunStatus};

/// One `(task, error behavior)` pair of a profile.
#[derive(Debug, Clone)]
pub struct ProfileEntry {
    pub task: Arc<TaskDefinition>,
    pub error_behavior: ErrorBehavior,
}

impl ProfileEntry {
    pub fn new(task: Arc<TaskDefinition>, error_behavior: ErrorBehavior) -> Self {
        Self {
            task,
            error_behavior,
        }
    }
}

/// A named, ordered pipeline of tasks.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub entries: Vec<ProfileEntry>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: Arc<TaskDefinition>, error_behavior: ErrorBehavior) -> Self {
        self.entries.push(ProfileEntry::new(task, error_behavior));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Run-time record of one task inside a [`ProfileRun`].
///
/// Only the orchestrator writes these fields, and only while it is on this
/// task.
#[derive(Debug, Clone)]
pub struct TaskRun {
    pub task: Arc<TaskDefinition>,
    pub error_behavior: ErrorBehavior,
    pub status: RunStatus,
    pub result_message: Option<String>,
    pub warnings: Option<Vec<String>>,
    pub errors: Option<Vec<String>>,
    pub exception: Option<TaskException>,
    pub output: OutputLog,
}

impl TaskRun {
    fn new(index: usize, entry: &ProfileEntry) -> Self {
        Self {
            task: Arc::clone(&entry.task),
            error_behavior: entry.error_behavior,
            status: RunStatus::Pending,
            result_message: None,
            warnings: None,
            errors: None,
            exception: None,
            output: OutputLog::new(index),
        }
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Copy a handler's result onto this record and derive the terminal
    /// status from its result type.
    pub fn record(&mut self, result: TaskInvocationResult) {
        self.status = match result.result_type() {
            ResultType::Success => RunStatus::Success,
            ResultType::Error => RunStatus::Error,
        };
        self.result_message = Some(result.message);
        self.warnings = non_empty(result.warnings);
        self.errors = non_empty(result.errors);
        self.exception = result.exception;
    }
}

fn non_empty(lines: Vec<String>) -> Option<Vec<String>> {
    if lines.is_empty() { None } else { Some(lines) }
}

/// Mutable state of one profile execution. Created fresh for every run.
#[derive(Debug, Clone)]
pub struct ProfileRun {
    pub name: String,
    pub status: RunStatus,
    pub elapsed_ms: Option<u64>,
    pub tasks: Vec<TaskRun>,
}

impl ProfileRun {
    pub fn new(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            status: RunStatus::Pending,
            elapsed_ms: None,
            tasks: profile
                .entries
                .iter()
                .enumerate()
                .map(|(index, entry)| TaskRun::new(index, entry))
                .collect(),
        }
    }

    pub fn task(&self, name: &str) -> Option<&TaskRun> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    pub fn statuses(&self) -> Vec<RunStatus> {
        self.tasks.iter().map(|t| t.status).collect()
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskRun> {
        self.tasks.iter().filter(|t| t.status == RunStatus::Error)
    }
}
