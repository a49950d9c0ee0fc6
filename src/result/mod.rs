// src/result/mod.rs

//! Value types describing the outcome of validation, of a single process
//! invocation, and of a whole task invocation.
//!
//! - [`validation`]: pre-run static checks (`Warning` / `Error`).
//! - [`output`]: typed lines appended to a task's output log.
//! - [`invocation`]: what a task handler returns after running.
//! - [`process`]: exit code / launch failure of one external process.

pub mod invocation;
pub mod output;
pub mod process;
pub mod validation;

use std::sync::Arc;

pub use invocation::{ResultType, TaskInvocationResult};
pub use output::{OutputLine, OutputLineKind};
pub use process::ProcessInvocationResult;
pub use validation::{ValidateResult, ValidationKind};

/// An underlying failure attached to a result.
///
/// Shared so results stay cheap to clone into run records and events.
pub type TaskException = Arc<anyhow::Error>;
