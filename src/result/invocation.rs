// src/result/invocation.rs

use crate::errors::AcsBuildError;
use crate::result::TaskException;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Success,
    Error,
}

/// What a task handler reports after running.
///
/// The result type is not stored: it is `Error` exactly when `errors` is
/// non-empty or an exception is attached. Constructors below keep the
/// message of a failure in `errors` so a failure can never look like a
/// success.
#[derive(Debug, Clone, Default)]
pub struct TaskInvocationResult {
    pub message: String,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub exception: Option<TaskException>,
}

impl TaskInvocationResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// A failure whose only detail is its message.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            errors: vec![message.clone()],
            message,
            ..Default::default()
        }
    }

    /// A failure with explicit error lines. Falls back to the message when
    /// `errors` is empty.
    pub fn failure_with(message: impl Into<String>, errors: Vec<String>) -> Self {
        let message = message.into();
        let errors = if errors.is_empty() {
            vec![message.clone()]
        } else {
            errors
        };
        Self {
            message,
            errors,
            ..Default::default()
        }
    }

    pub fn from_exception(message: impl Into<String>, exception: TaskException) -> Self {
        Self {
            message: message.into(),
            exception: Some(exception),
            ..Default::default()
        }
    }

    pub fn from_error(message: impl Into<String>, err: impl Into<anyhow::Error>) -> Self {
        Self::from_exception(message, TaskException::new(err.into()))
    }

    /// Result recorded for a task that was stopped by a cancellation request.
    pub fn cancelled() -> Self {
        Self::from_error("Task was cancelled", AcsBuildError::Cancelled)
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn result_type(&self) -> ResultType {
        if !self.errors.is_empty() || self.exception.is_some() {
            ResultType::Error
        } else {
            ResultType::Success
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_type() == ResultType::Success
    }

    /// True if this result stems from cancellation rather than from the
    /// task itself failing.
    pub fn is_cancelled(&self) -> bool {
        self.exception
            .as_ref()
            .and_then(|e| e.downcast_ref::<AcsBuildError>())
            .is_some_and(|e| matches!(e, AcsBuildError::Cancelled))
    }
}
