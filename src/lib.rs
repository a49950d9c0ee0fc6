// src/lib.rs

pub mod classify;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod result;
pub mod task;
pub mod types;

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ProjectFile};
use crate::engine::{Orchestrator, Profile, ProfileRun, RunEvent};
use crate::result::{OutputLineKind, ValidateResult, ValidationKind};
use crate::task::{HandlerRegistry, Runnable, TaskDefinition};
use crate::types::RunStatus;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project loading
/// - the validation pass
/// - the orchestrator with the built-in handlers
/// - Ctrl-C handling and progress printing
///
/// Returns the final status of the profile (or of validation, for
/// `--validate-only`). Configuration problems are returned as `Err`.
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    let project = load_and_validate(&args.project)?;

    if args.list {
        print_listing(&project);
        return Ok(RunStatus::Success);
    }

    let profile_name = args
        .profile
        .as_deref()
        .ok_or_else(|| anyhow!("--profile is required unless --list is given"))?;
    let profile = project.profile(profile_name)?;

    let cancel = CancellationToken::new();
    let orchestrator =
        Orchestrator::new(HandlerRegistry::with_builtin_handlers()).with_cancellation(cancel.clone());
    let mut ctx = project.invocation_context();

    let findings = orchestrator.validate_profile(&profile, &ctx);
    let has_errors = print_validation(&findings);

    if args.dry_run {
        print_dry_run(&profile);
        return Ok(RunStatus::Success);
    }

    if args.validate_only {
        return Ok(if has_errors {
            RunStatus::Error
        } else {
            RunStatus::Success
        });
    }

    if has_errors && !args.force {
        bail!("validation reported errors; fix them or pass --force to run anyway");
    }

    // Ctrl-C → cancel the running task and skip the rest.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        info!("Ctrl+C received; cancelling profile");
        cancel.cancel();
    });

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(rx));

    let orchestrator = orchestrator.with_events(tx);
    let outcome = orchestrator.run_profile(&profile, &mut ctx).await;
    // Last sender gone: the printer drains what is left and stops.
    drop(orchestrator);
    if let Err(err) = printer.await {
        debug!(error = %err, "event printer stopped early");
    }

    let run = outcome?;
    print_summary(&run);
    Ok(run.status)
}

fn print_listing(project: &ProjectFile) {
    println!("tasks:");
    for task in project.tasks() {
        println!("  {:<24} {}", task.name(), task.handler_kind());
    }

    println!();
    println!("profiles:");
    for name in project.profile_names() {
        match project.profile(name) {
            Ok(profile) => {
                let tasks: Vec<&str> = profile.entries.iter().map(|e| e.task.name()).collect();
                println!("  {:<24} {}", name, tasks.join(" -> "));
            }
            Err(err) => println!("  {name:<24} <{err}>"),
        }
    }
}

fn print_dry_run(profile: &Profile) {
    println!("acsbuild dry-run: profile '{}'", profile.name);
    for (index, entry) in profile.entries.iter().enumerate() {
        println!(
            "  {}. {} ({}, {})",
            index + 1,
            entry.task.name(),
            entry.task.handler_kind(),
            entry.error_behavior
        );
    }
    debug!("dry-run complete (no execution)");
}

/// Print validation findings; returns true if any of them is an error.
fn print_validation(findings: &[(Arc<TaskDefinition>, Vec<ValidateResult>)]) -> bool {
    let mut has_errors = false;
    for (task, results) in findings {
        for result in results {
            let label = match result.kind {
                ValidationKind::Warning => "warning",
                ValidationKind::Error => {
                    has_errors = true;
                    "error"
                }
            };
            eprintln!("{label}: [{}] {}", task.name(), result.message);
        }
    }
    has_errors
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<RunEvent>) {
    let mut total = 0;
    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::ProfileStarted {
                profile,
                task_count,
            } => {
                total = task_count;
                println!("==> profile '{profile}' ({task_count} task(s))");
            }
            RunEvent::TaskStatusChanged {
                index,
                task,
                status,
            } => match status {
                RunStatus::Running => println!("[{}/{total}] {task}", index + 1),
                RunStatus::Success | RunStatus::Error => {
                    println!("[{}/{total}] {task}: {status}", index + 1)
                }
                RunStatus::Pending => {}
            },
            RunEvent::OutputLine { line, .. } => {
                let prefix = match line.kind {
                    OutputLineKind::Message => "   ",
                    OutputLineKind::Success => " ok",
                    OutputLineKind::Warning => "  !",
                    OutputLineKind::Error => " !!",
                };
                println!("{prefix} {}", line.text);
            }
            RunEvent::ProfileFinished {
                profile,
                status,
                elapsed_ms,
            } => println!("==> profile '{profile}' finished: {status} in {elapsed_ms} ms"),
        }
    }
}

fn print_summary(run: &ProfileRun) {
    let failed: Vec<&str> = run.failed_tasks().map(|t| t.name()).collect();
    if !failed.is_empty() {
        println!("failed tasks: {}", failed.join(", "));
    }
    let pending = run
        .tasks
        .iter()
        .filter(|t| t.status == RunStatus::Pending)
        .count();
    if pending > 0 {
        println!("{pending} task(s) not run");
    }
}
