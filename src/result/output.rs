// src/result/output.rs

use std::fmt;

use crate::result::TaskException;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLineKind {
    Message,
    Success,
    Warning,
    Error,
}

/// A single typed line of a task's output log.
#[derive(Debug, Clone)]
pub struct OutputLine {
    pub kind: OutputLineKind,
    pub text: String,
    pub exception: Option<TaskException>,
}

impl OutputLine {
    pub fn new(kind: OutputLineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            exception: None,
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self::new(OutputLineKind::Message, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(OutputLineKind::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(OutputLineKind::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(OutputLineKind::Error, text)
    }

    pub fn with_exception(mut self, exception: TaskException) -> Self {
        self.exception = Some(exception);
        self
    }
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OutputLineKind::Message => write!(f, "{}", self.text),
            OutputLineKind::Success => write!(f, "ok: {}", self.text),
            OutputLineKind::Warning => write!(f, "warning: {}", self.text),
            OutputLineKind::Error => write!(f, "error: {}", self.text),
        }
    }
}
