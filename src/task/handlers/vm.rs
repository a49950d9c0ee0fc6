// src/task/handlers/vm.rs

//! Runs a compiled object in the ACS VM.
//!
//! Whatever the script prints on stdout is the interesting part, so stdout
//! lines go straight into the output log while the VM runs. stderr is
//! classified like BCC output once the VM exits.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::classify::bcc::classify_stderr;
use crate::context::{keys, InvocationContext};
use crate::errors::Result;
use crate::exec::{run_process_lines, LineCapture, ProcessSpec, StreamKind};
use crate::result::TaskInvocationResult;
use crate::task::handlers::{capture_dir, check_tools, report_details, report_outcome, tool_path};
use crate::task::{HandlerFuture, OutputLog, RunInVmTask, TaskDefinition, TaskHandler, TaskKind};

const TOOL: &str = "ACS VM";

pub fn factory(task: &Arc<TaskDefinition>) -> Option<Box<dyn TaskHandler>> {
    match &task.kind {
        TaskKind::RunInVm(params) => Some(Box::new(RunInVmHandler {
            name: task.name.clone(),
            params: params.clone(),
        })),
        _ => None,
    }
}

pub struct RunInVmHandler {
    name: String,
    params: RunInVmTask,
}

impl TaskHandler for RunInVmHandler {
    fn check_context(&self, ctx: &InvocationContext) -> Result<()> {
        check_tools(ctx, &[keys::ACS_VM])
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut InvocationContext,
        output: &'a mut OutputLog,
        cancel: &'a CancellationToken,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let result = self.run(ctx, output, cancel).await;
            report_outcome(output, &result);
            result
        })
    }
}

impl RunInVmHandler {
    async fn run(
        &self,
        ctx: &InvocationContext,
        output: &mut OutputLog,
        cancel: &CancellationToken,
    ) -> TaskInvocationResult {
        let exe = match tool_path(ctx, keys::ACS_VM, TOOL) {
            Ok(exe) => exe,
            Err(failed) => return failed,
        };

        let object = ctx.resolve(&self.params.input);
        let spec = ProcessSpec::new(exe)
            .args(&self.params.extra_args)
            .arg(&object)
            .current_dir(ctx.base_directory());

        output.message(format!("Running {}", ctx.display_relative(&object)));

        let mut capture = LineCapture::default();
        let process = run_process_lines(&spec, cancel, |kind, line| {
            capture.push(kind, line);
            if kind == StreamKind::Stdout {
                output.message(line);
            }
        })
        .await;

        if let Some(dir) = capture_dir(ctx, &self.name) {
            dir.save_or_warn(&capture.stdout, &capture.stderr).await;
        }

        let stderr = String::from_utf8_lossy(&capture.stderr);
        let result = classify_stderr(TOOL, &process, &stderr);
        if result.is_success() {
            report_details(output, &result);
        }
        result
    }
}
