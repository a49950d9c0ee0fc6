// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! These are *configuration* and *programming* errors: things that stop a
//! profile run before (or instead of) executing it. A task that fails at run
//! time is never an `AcsBuildError`; it is a
//! [`TaskInvocationResult`](crate::result::TaskInvocationResult) of type
//! `Error` recorded on the task.

use thiserror::Error;

use crate::task::HandlerKind;

#[derive(Error, Debug)]
pub enum AcsBuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("No handler registered for handler type '{kind}' (task '{task}')")]
    UnknownHandler { kind: HandlerKind, task: String },

    #[error("Handler for '{kind}' cannot run task '{task}' (task kind mismatch)")]
    HandlerMismatch { kind: HandlerKind, task: String },

    #[error("Context key '{0}' was never configured")]
    MissingContextKey(String),

    #[error("Context key '{key}' holds a {found} value, expected {expected}")]
    WrongContextType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Operation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AcsBuildError {
    /// True for errors that come from a bad project/tool configuration
    /// rather than from running anything.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AcsBuildError::ConfigError(_)
                | AcsBuildError::UnknownHandler { .. }
                | AcsBuildError::HandlerMismatch { .. }
                | AcsBuildError::MissingContextKey(_)
                | AcsBuildError::WrongContextType { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AcsBuildError>;
