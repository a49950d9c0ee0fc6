// src/engine/mod.rs

//! Profile execution engine.
//!
//! - [`run_state`]: profiles and the mutable per-run records the
//!   orchestrator writes into.
//! - [`orchestrator`]: the sequential task loop with its fail-fast policy,
//!   plus the validation pass.
//! - [`events`]: progress notifications for anyone watching a run.

pub mod events;
pub mod orchestrator;
pub mod run_state;

pub use events::RunEvent;
pub use orchestrator::Orchestrator;
pub use run_state::{Profile, ProfileEntry, ProfileRun, TaskRun};
