// src/engine/orchestrator.rs

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::InvocationContext;
use crate::errors::Result;
use crate::result::{TaskInvocationResult, ValidateResult};
use crate::task::{HandlerRegistry, TaskDefinition, TaskHandler, Validatable};
use crate::types::{ErrorBehavior, RunStatus};

use super::{Profile, ProfileRun, RunEvent};

/// Runs profiles task by task.
///
/// One orchestrator can run many profiles one after another; each run gets
/// its own [`ProfileRun`] and [`InvocationContext`]. Tasks of a profile never
/// overlap.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: HandlerRegistry,
    cancel: CancellationToken,
    events: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl Orchestrator {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            cancel: CancellationToken::new(),
            events: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Create a fresh run for `profile` and invoke it.
    pub async fn run_profile(&self, profile: &Profile, ctx: &mut InvocationContext) -> Result<ProfileRun> {
        let mut run = ProfileRun::new(profile);
        self.invoke_profile(&mut run, ctx).await?;
        Ok(run)
    }

    /// Execute every task of `run` in order, updating statuses in place.
    ///
    /// All handlers are resolved and their context requirements checked
    /// before the first task starts. A failure there (unknown handler, tool
    /// path missing from the context bag) is returned as `Err`, with the
    /// profile marked `Error` and every task left `Pending`.
    ///
    /// Task failures never produce `Err`: they are recorded on the task, and
    /// the task's [`ErrorBehavior`] decides whether the run goes on.
    pub async fn invoke_profile(&self, run: &mut ProfileRun, ctx: &mut InvocationContext) -> Result<()> {
        let started = Instant::now();
        info!(profile = %run.name, tasks = run.tasks.len(), "profile started");

        run.status = RunStatus::Running;
        self.emit(RunEvent::ProfileStarted {
            profile: run.name.clone(),
            task_count: run.tasks.len(),
        });

        let handlers = match self.prepare(run, ctx) {
            Ok(handlers) => handlers,
            Err(err) => {
                warn!(profile = %run.name, error = %err, "profile aborted before running any task");
                self.finish(run, RunStatus::Error, started);
                return Err(err);
            }
        };

        let mut status = RunStatus::Success;

        for (index, handler) in handlers.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(profile = %run.name, task = %run.tasks[index].name(), "cancelled before task start");
                self.set_task_status(run, index, RunStatus::Running);
                self.complete_task(run, index, TaskInvocationResult::cancelled());
                status = RunStatus::Error;
                break;
            }

            self.set_task_status(run, index, RunStatus::Running);

            let task = &mut run.tasks[index];
            task.output.attach(self.events.clone());
            debug!(task = %task.name(), index, "invoking handler");
            let result = handler.handle(ctx, &mut task.output, &self.cancel).await;
            task.output.attach(None);

            let cancelled = result.is_cancelled();
            self.complete_task(run, index, result);

            let task = &run.tasks[index];
            if task.status != RunStatus::Error {
                continue;
            }

            if cancelled {
                info!(task = %task.name(), "task cancelled; stopping profile");
                status = RunStatus::Error;
                break;
            }

            match task.error_behavior {
                ErrorBehavior::StopOnError => {
                    warn!(task = %task.name(), "task failed; stopping profile");
                    status = RunStatus::Error;
                    break;
                }
                ErrorBehavior::DontStop => {
                    warn!(task = %task.name(), "task failed; continuing (dont_stop)");
                }
            }
        }

        self.finish(run, status, started);
        Ok(())
    }

    /// Run every task's static checks without executing anything.
    pub fn validate_profile(
        &self,
        profile: &Profile,
        ctx: &InvocationContext,
    ) -> Vec<(Arc<TaskDefinition>, Vec<ValidateResult>)> {
        profile
            .entries
            .iter()
            .map(|entry| {
                let results = entry.task.validate(ctx);
                debug!(task = %entry.task.name, findings = results.len(), "validated task");
                (Arc::clone(&entry.task), results)
            })
            .collect()
    }

    fn prepare(&self, run: &ProfileRun, ctx: &InvocationContext) -> Result<Vec<Box<dyn TaskHandler>>> {
        run.tasks
            .iter()
            .map(|task| {
                let handler = self.registry.resolve(&task.task)?;
                handler.check_context(ctx)?;
                Ok(handler)
            })
            .collect()
    }

    fn complete_task(&self, run: &mut ProfileRun, index: usize, result: TaskInvocationResult) {
        let task = &mut run.tasks[index];
        task.record(result);
        info!(
            task = %task.name(),
            status = %task.status,
            message = task.result_message.as_deref().unwrap_or_default(),
            "task finished"
        );
        self.emit(RunEvent::TaskStatusChanged {
            index,
            task: task.name().to_string(),
            status: task.status,
        });
    }

    fn set_task_status(&self, run: &mut ProfileRun, index: usize, status: RunStatus) {
        let task = &mut run.tasks[index];
        task.status = status;
        self.emit(RunEvent::TaskStatusChanged {
            index,
            task: task.name().to_string(),
            status,
        });
    }

    fn finish(&self, run: &mut ProfileRun, status: RunStatus, started: Instant) {
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        run.status = status;
        run.elapsed_ms = Some(elapsed_ms);
        info!(profile = %run.name, %status, elapsed_ms, "profile finished");
        self.emit(RunEvent::ProfileFinished {
            profile: run.name.clone(),
            status,
            elapsed_ms,
        });
    }

    fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
