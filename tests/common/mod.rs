#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;

use acsbuild::task::{HandlerRegistry, OutputLog, TaskDefinition};
use acsbuild::context::InvocationContext;
use acsbuild::result::TaskInvocationResult;
use tokio_util::sync::CancellationToken;

pub use acsbuild_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Resolve `task` through the built-in registry and run its handler once,
/// outside of any profile.
pub async fn run_builtin(
    task: &Arc<TaskDefinition>,
    ctx: &mut InvocationContext,
) -> Result<(TaskInvocationResult, OutputLog), Box<dyn Error>> {
    let registry = HandlerRegistry::with_builtin_handlers();
    let handler = registry.resolve(task)?;
    handler.check_context(ctx)?;
    let mut output = OutputLog::new(0);
    let cancel = CancellationToken::new();
    let result = handler.handle(ctx, &mut output, &cancel).await;
    Ok((result, output))
}
