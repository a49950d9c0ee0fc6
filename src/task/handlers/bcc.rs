// src/task/handlers/bcc.rs

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::classify::bcc;
use crate::context::{keys, InvocationContext};
use crate::errors::Result;
use crate::exec::{run_captured, ProcessSpec};
use crate::result::TaskInvocationResult;
use crate::task::handlers::{
    capture_dir, check_tools, echo_lines, include_args, prepare_output_dir, report_details,
    report_outcome, tool_path,
};
use crate::task::{BccCompileTask, HandlerFuture, OutputLog, TaskDefinition, TaskHandler, TaskKind};

pub fn factory(task: &Arc<TaskDefinition>) -> Option<Box<dyn TaskHandler>> {
    match &task.kind {
        TaskKind::BccCompile(params) => Some(Box::new(BccCompileHandler {
            name: task.name.clone(),
            params: params.clone(),
        })),
        _ => None,
    }
}

/// `bcc [-i dir]... [extra]... <input> <output>`
pub struct BccCompileHandler {
    name: String,
    params: BccCompileTask,
}

impl TaskHandler for BccCompileHandler {
    fn check_context(&self, ctx: &InvocationContext) -> Result<()> {
        check_tools(ctx, &[keys::BCC_COMPILER])
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut InvocationContext,
        output: &'a mut OutputLog,
        cancel: &'a CancellationToken,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let result = self.compile(ctx, output, cancel).await;
            report_outcome(output, &result);
            result
        })
    }
}

impl BccCompileHandler {
    async fn compile(
        &self,
        ctx: &InvocationContext,
        output: &mut OutputLog,
        cancel: &CancellationToken,
    ) -> TaskInvocationResult {
        let exe = match tool_path(ctx, keys::BCC_COMPILER, "BCC compiler") {
            Ok(exe) => exe,
            Err(failed) => return failed,
        };

        let input = ctx.resolve(&self.params.input);
        let object = ctx.resolve(&self.params.output);
        if let Err(failed) = prepare_output_dir(ctx, &object) {
            return failed;
        }

        let spec = ProcessSpec::new(exe)
            .args(include_args("-i", ctx, &self.params.include_dirs))
            .args(&self.params.extra_args)
            .arg(&input)
            .arg(&object)
            .current_dir(ctx.base_directory());

        output.message(format!(
            "Compiling {} -> {}",
            ctx.display_relative(&input),
            ctx.display_relative(&object)
        ));

        let captured = run_captured(&spec, cancel).await;
        debug!(task = %self.name, exit_code = ?captured.result.exit_code, "BCC exited");

        if let Some(capture) = capture_dir(ctx, &self.name) {
            capture.save_or_warn(&captured.stdout, &captured.stderr).await;
        }

        echo_lines(output, &captured.stdout_text());

        let result = bcc::classify(&captured.result, &captured.stderr_text());
        if result.is_success() {
            report_details(output, &result);
        }
        result
    }
}
