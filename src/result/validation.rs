// src/result/validation.rs

use std::fmt;

use crate::result::TaskException;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    Warning,
    Error,
}

/// One finding of a task's pre-run validation.
#[derive(Debug, Clone)]
pub struct ValidateResult {
    pub kind: ValidationKind,
    pub message: String,
    pub exception: Option<TaskException>,
}

impl ValidateResult {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Warning,
            message: message.into(),
            exception: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Error,
            message: message.into(),
            exception: None,
        }
    }

    pub fn with_exception(mut self, err: anyhow::Error) -> Self {
        self.exception = Some(TaskException::new(err));
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == ValidationKind::Error
    }
}

impl PartialEq for ValidateResult {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.message == other.message
            && self.exception.is_some() == other.exception.is_some()
    }
}

impl fmt::Display for ValidateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            ValidationKind::Warning => "warning",
            ValidationKind::Error => "error",
        };
        write!(f, "{tag}: {}", self.message)
    }
}
