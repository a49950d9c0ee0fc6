// src/task/handlers/acc.rs

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::classify::acc;
use crate::context::{keys, InvocationContext};
use crate::errors::Result;
use crate::exec::{run_captured, ProcessSpec};
use crate::result::TaskInvocationResult;
use crate::task::handlers::{
    capture_dir, check_tools, echo_lines, include_args, prepare_output_dir, report_outcome, tool_path,
};
use crate::task::{AccCompileTask, HandlerFuture, OutputLog, TaskDefinition, TaskHandler, TaskKind};

pub fn factory(task: &Arc<TaskDefinition>) -> Option<Box<dyn TaskHandler>> {
    match &task.kind {
        TaskKind::AccCompile(params) => Some(Box::new(AccCompileHandler {
            name: task.name.clone(),
            params: params.clone(),
        })),
        _ => None,
    }
}

/// `acc [-i dir]... [extra]... <input> <output>`
pub struct AccCompileHandler {
    name: String,
    params: AccCompileTask,
}

impl TaskHandler for AccCompileHandler {
    fn check_context(&self, ctx: &InvocationContext) -> Result<()> {
        check_tools(ctx, &[keys::ACC_COMPILER])
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

impl AccCompileHandler {
    async fn compile(
        &self,
        ctx: &InvocationContext,
        output: &mut OutputLog,
        cancel: &CancellationToken,
    ) -> TaskInvocationResult {
        let exe = match tool_path(ctx, keys::ACC_COMPILER, "ACC compiler") {
            Ok(exe) => exe,
            Err(failed) => return failed,
        };

        let input = ctx.resolve(&self.params.input);
        let object = ctx.resolve(&self.params.output);
        let error_file = acc::error_file_path(&input);

        match acc::backup_error_file(ctx.fs(), &error_file) {
            Ok(Some(backup)) => output.message(format!(
                "Moved previous {} to {}",
                acc::ERROR_FILE_NAME,
                ctx.display_relative(&backup)
            )),
            Ok(None) => {}
            Err(err) => {
                return TaskInvocationResult::from_error(
                    format!("Could not move the previous {} out of the way", acc::ERROR_FILE_NAME),
                    err,
                );
            }
        }

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
        debug!(task = %self.name, exit_code = ?captured.result.exit_code, "ACC exited");

        if let Some(capture) = capture_dir(ctx, &self.name) {
            capture.save_or_warn(&captured.stdout, &captured.stderr).await;
        }

        echo_lines(output, &captured.stdout_text());

        let error_text = acc::collect_error_file(ctx.fs(), &error_file, self.params.keep_error_file);
        acc::classify(&captured.result, error_text.as_deref())
    }
}
