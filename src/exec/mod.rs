// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`runner`] spawns one external process with `tokio::process::Command`,
//!   drains stdout/stderr concurrently with waiting for exit, and honours
//!   cancellation by killing the child's process group.
//! - [`capture`] writes optional per-task copies of the captured streams.

pub mod capture;
pub mod runner;

pub use capture::{CaptureDir, LineCapture};
pub use runner::{
    run_captured, run_process, run_process_lines, CapturedOutput, ProcessSpec, Sink, StreamKind,
};
