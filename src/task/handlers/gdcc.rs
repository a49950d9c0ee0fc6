// src/task/handlers/gdcc.rs

//! GDCC tool family.
//!
//! All four tools share one invocation shape:
//!
//! `tool [--bc-target T] [-i dir]... [extra]... --output <out> <inputs>...`
//!
//! stderr is classified line by line while the tool runs, so warnings and
//! errors show up in the task's output log as they are produced.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::classify::gdcc::GdccClassifier;
use crate::context::{keys, InvocationContext};
use crate::errors::Result;
use crate::exec::{run_process_lines, LineCapture, ProcessSpec, StreamKind};
use crate::result::TaskInvocationResult;
use crate::task::handlers::{
    capture_dir, check_tools, include_args, prepare_output_dir, report_outcome, tool_path,
};
use crate::task::{GdccBuildTask, HandlerFuture, OutputLog, TaskDefinition, TaskHandler, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdccTool {
    Acc,
    Cc,
    Ld,
    MakeLib,
}

impl GdccTool {
    pub fn label(self) -> &'static str {
        match self {
            GdccTool::Acc => "GDCC-ACC",
            GdccTool::Cc => "GDCC-CC",
            GdccTool::Ld => "GDCC-LD",
            GdccTool::MakeLib => "GDCC-MakeLib",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            GdccTool::Acc => keys::GDCC_ACC_COMPILER,
            GdccTool::Cc => keys::GDCC_CC_COMPILER,
            GdccTool::Ld => keys::GDCC_LINKER,
            GdccTool::MakeLib => keys::GDCC_MAKELIB,
        }
    }

    fn classifier(self, base_dir: Option<&Path>) -> GdccClassifier {
        let classifier = GdccClassifier::new(self.label());
        match self {
            GdccTool::Cc => classifier.with_structured_diagnostics(base_dir),
            _ => classifier,
        }
    }
}

/// Arguments of one GDCC tool run, before path resolution.
#[derive(Debug, Clone, Default)]
struct GdccArgs {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    include_dirs: Vec<PathBuf>,
    target: Option<String>,
    extra_args: Vec<String>,
}

impl GdccArgs {
    fn to_spec(&self, exe: PathBuf, ctx: &InvocationContext) -> ProcessSpec {
        let mut spec = ProcessSpec::new(exe);
        if let Some(target) = &self.target {
            spec = spec.arg("--bc-target").arg(target);
        }
        spec.args(include_args("-i", ctx, &self.include_dirs))
            .args(&self.extra_args)
            .arg("--output")
            .arg(ctx.resolve(&self.output))
            .args(self.inputs.iter().map(|input| ctx.resolve(input)))
            .current_dir(ctx.base_directory())
    }
}

pub fn factory(task: &Arc<TaskDefinition>) -> Option<Box<dyn TaskHandler>> {
    let (tool, args) = match &task.kind {
        TaskKind::GdccAccCompile(p) | TaskKind::GdccCcCompile(p) => {
            let tool = if matches!(task.kind, TaskKind::GdccAccCompile(_)) {
                GdccTool::Acc
            } else {
                GdccTool::Cc
            };
            let args = GdccArgs {
                inputs: vec![p.input.clone()],
                output: p.output.clone(),
                include_dirs: p.include_dirs.clone(),
                target: p.target.clone(),
                extra_args: p.extra_args.clone(),
            };
            (tool, args)
        }
        TaskKind::GdccLink(p) => (
            GdccTool::Ld,
            GdccArgs {
                inputs: p.inputs.clone(),
                output: p.output.clone(),
                target: p.target.clone(),
                extra_args: p.extra_args.clone(),
                ..GdccArgs::default()
            },
        ),
        TaskKind::GdccMakeLib(p) => (
            GdccTool::MakeLib,
            GdccArgs {
                inputs: p.libraries.iter().map(PathBuf::from).collect(),
                output: p.output.clone(),
                target: p.target.clone(),
                extra_args: p.extra_args.clone(),
                ..GdccArgs::default()
            },
        ),
        _ => return None,
    };

    Some(Box::new(GdccHandler {
        name: task.name.clone(),
        tool,
        args,
    }))
}

pub fn build_factory(task: &Arc<TaskDefinition>) -> Option<Box<dyn TaskHandler>> {
    match &task.kind {
        TaskKind::GdccBuild(params) => Some(Box::new(GdccBuildHandler {
            name: task.name.clone(),
            params: params.clone(),
        })),
        _ => None,
    }
}

/// Single gdcc-acc / gdcc-cc / gdcc-ld / gdcc-makelib run.
pub struct GdccHandler {
    name: String,
    tool: GdccTool,
    args: GdccArgs,
}

impl TaskHandler for GdccHandler {
    fn check_context(&self, ctx: &InvocationContext) -> Result<()> {
        check_tools(ctx, &[self.tool.key()])
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut InvocationContext,
        output: &'a mut OutputLog,
        cancel: &'a CancellationToken,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let mut capture = LineCapture::default();
            let result = run_stage(self.tool, &self.args, ctx, output, &mut capture, cancel).await;
            save_capture(ctx, &self.name, &capture).await;
            report_outcome(output, &result);
            result
        })
    }
}

/// `gdcc_build`: gdcc-cc each source into `<object_dir>/<stem>.ir`, then
/// gdcc-ld all objects into the output. The first failing stage ends the
/// build; warnings of every stage that ran are kept.
pub struct GdccBuildHandler {
    name: String,
    params: GdccBuildTask,
}

impl TaskHandler for GdccBuildHandler {
    fn check_context(&self, ctx: &InvocationContext) -> Result<()> {
        check_tools(ctx, &[GdccTool::Cc.key(), GdccTool::Ld.key()])
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut InvocationContext,
        output: &'a mut OutputLog,
        cancel: &'a CancellationToken,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let mut capture = LineCapture::default();
            let result = self.build(ctx, output, &mut capture, cancel).await;
            save_capture(ctx, &self.name, &capture).await;
            report_outcome(output, &result);
            result
        })
    }
}

impl GdccBuildHandler {
    fn object_dir(&self) -> PathBuf {
        match &self.params.object_dir {
            Some(dir) => dir.clone(),
            None => self
                .params
                .output
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }

    async fn build(
        &self,
        ctx: &InvocationContext,
        output: &mut OutputLog,
        capture: &mut LineCapture,
        cancel: &CancellationToken,
    ) -> TaskInvocationResult {
        if self.params.sources.is_empty() {
            return TaskInvocationResult::failure("No source files to build");
        }

        let object_dir = self.object_dir();
        let objects_for = object_names(&self.params.sources);
        let mut objects = Vec::with_capacity(self.params.sources.len());
        let mut warnings = Vec::new();

        for (source, name) in self.params.sources.iter().zip(objects_for) {
            let object = object_dir.join(name);

            let args = GdccArgs {
                inputs: vec![source.clone()],
                output: object.clone(),
                include_dirs: self.params.include_dirs.clone(),
                target: self.params.target.clone(),
                extra_args: self.params.cc_args.clone(),
            };

            output.message(format!("[cc] {}", source.display()));
            let stage = run_stage(GdccTool::Cc, &args, ctx, output, capture, cancel).await;
            warnings.extend(stage.warnings.iter().cloned());
            if !stage.is_success() {
                info!(task = %self.name, source = %source.display(), "gdcc build stopped at compile stage");
                return stage_failure(stage, warnings);
            }
            objects.push(object);
        }

        let args = GdccArgs {
            inputs: objects,
            output: self.params.output.clone(),
            target: self.params.target.clone(),
            extra_args: self.params.ld_args.clone(),
            ..GdccArgs::default()
        };

        output.message(format!("[ld] {}", self.params.output.display()));
        let stage = run_stage(GdccTool::Ld, &args, ctx, output, capture, cancel).await;
        warnings.extend(stage.warnings.iter().cloned());
        if !stage.is_success() {
            return stage_failure(stage, warnings);
        }

        let message = format!(
            "GDCC build finished: {} source(s) linked into {}",
            self.params.sources.len(),
            self.params.output.display()
        );
        TaskInvocationResult::success(message).with_warnings(warnings)
    }
}

/// One object file name per source, `<stem>.ir`. A stem seen before gets
/// `-<n>` appended, with `n` the smallest number giving an unused name.
fn object_names(sources: &[PathBuf]) -> Vec<String> {
    let mut used = HashSet::new();
    sources
        .iter()
        .map(|source| {
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "object".to_string());
            let mut name = format!("{stem}.ir");
            let mut n = 1;
            while !used.insert(name.clone()) {
                name = format!("{stem}-{n}.ir");
                n += 1;
            }
            name
        })
        .collect()
}

/// Failed stage result carrying the warnings of all earlier stages too.
fn stage_failure(stage: TaskInvocationResult, warnings: Vec<String>) -> TaskInvocationResult {
    TaskInvocationResult {
        warnings,
        ..stage
    }
}

async fn run_stage(
    tool: GdccTool,
    args: &GdccArgs,
    ctx: &InvocationContext,
    output: &mut OutputLog,
    capture: &mut LineCapture,
    cancel: &CancellationToken,
) -> TaskInvocationResult {
    let exe = match tool_path(ctx, tool.key(), tool.label()) {
        Ok(exe) => exe,
        Err(failed) => return failed,
    };
    if let Err(failed) = prepare_output_dir(ctx, &ctx.resolve(&args.output)) {
        return failed;
    }

    let spec = args.to_spec(exe, ctx);
    let mut classifier = tool.classifier(ctx.base_directory());

    let process = run_process_lines(&spec, cancel, |kind, line| {
        capture.push(kind, line);
        match kind {
            StreamKind::Stderr => {
                if let Some(classified) = classifier.push_line(line) {
                    output.push(classified);
                }
            }
            StreamKind::Stdout => debug!(tool = tool.label(), line, "stdout"),
        }
    })
    .await;

    classifier.finish(&process)
}

async fn save_capture(ctx: &InvocationContext, task_name: &str, capture: &LineCapture) {
    if let Some(dir) = capture_dir(ctx, task_name) {
        dir.save_or_warn(&capture.stdout, &capture.stderr).await;
    }
}
