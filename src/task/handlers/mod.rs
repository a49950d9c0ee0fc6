// src/task/handlers/mod.rs

//! Built-in task handlers.
//!
//! - [`acc`] / [`bcc`]: single-file ACS compilers.
//! - [`gdcc`]: gdcc-acc, gdcc-cc, gdcc-ld, gdcc-makelib, and the
//!   compile-then-link `gdcc_build` pipeline.
//! - [`vm`]: run a compiled object in the ACS VM.
//! - [`files`]: copy / move / delete a file, copy the whole project.
//! - [`archive`]: pack a folder into a zip archive.

pub mod acc;
pub mod archive;
pub mod bcc;
pub mod files;
pub mod gdcc;
pub mod vm;

use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::context::{keys, InvocationContext};
use crate::errors;
use crate::exec::CaptureDir;
use crate::result::{OutputLine, TaskInvocationResult};
use crate::task::{HandlerKind, HandlerRegistry, OutputLog};

pub fn register_builtin(registry: &mut HandlerRegistry) {
    registry
        .register(HandlerKind::AccCompile, acc::factory)
        .register(HandlerKind::BccCompile, bcc::factory)
        .register(HandlerKind::GdccAccCompile, gdcc::factory)
        .register(HandlerKind::GdccCcCompile, gdcc::factory)
        .register(HandlerKind::GdccLink, gdcc::factory)
        .register(HandlerKind::GdccMakeLib, gdcc::factory)
        .register(HandlerKind::GdccBuild, gdcc::build_factory)
        .register(HandlerKind::RunInVm, vm::factory)
        .register(HandlerKind::CopyFile, files::factory)
        .register(HandlerKind::MoveFile, files::factory)
        .register(HandlerKind::DeleteFile, files::factory)
        .register(HandlerKind::CopyProject, files::copy_project_factory)
        .register(HandlerKind::ZipFolder, archive::factory);
}

/// Context check shared by every process-running handler: each tool key
/// must hold a path, and a configured capture root must be a path too.
pub(crate) fn check_tools(ctx: &InvocationContext, tools: &[&str]) -> errors::Result<()> {
    for key in tools {
        ctx.bag().get_path(key)?;
    }
    ctx.bag().get_optional_path(keys::TEMP_DIRECTORY).map(|_| ())
}

/// Tool executable from the context bag, or a finished `Error` result.
pub(crate) fn tool_path(
    ctx: &InvocationContext,
    key: &str,
    label: &str,
) -> Result<PathBuf, TaskInvocationResult> {
    ctx.bag()
        .get_path(key)
        .map(Path::to_path_buf)
        .map_err(|err| TaskInvocationResult::from_error(format!("{label} is not configured"), err))
}

/// Make sure the directory that will receive `output` exists.
pub(crate) fn prepare_output_dir(
    ctx: &InvocationContext,
    output: &Path,
) -> Result<(), TaskInvocationResult> {
    match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => ctx.fs().create_dir_all(dir).map_err(|err| {
            TaskInvocationResult::from_error(
                format!("Could not create output directory '{}'", dir.display()),
                err,
            )
        }),
        _ => Ok(()),
    }
}

/// Capture directory for a task. The temp root was already checked by
/// [`check_tools`], so a lookup failure here only disables capturing.
pub(crate) fn capture_dir(ctx: &InvocationContext, task_name: &str) -> Option<CaptureDir> {
    match CaptureDir::for_task(ctx, task_name) {
        Ok(dir) => dir,
        Err(err) => {
            tracing::warn!(task = %task_name, error = %err, "output capture disabled");
            None
        }
    }
}

pub(crate) fn include_args(flag: &str, ctx: &InvocationContext, dirs: &[PathBuf]) -> Vec<String> {
    dirs.iter()
        .flat_map(|dir| [flag.to_string(), ctx.resolve(dir).display().to_string()])
        .collect()
}

/// Append each non-empty line of `text` as a plain message.
pub(crate) fn echo_lines(output: &mut OutputLog, text: &str) {
    for line in text.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
        output.message(line);
    }
}

/// Append the warnings and errors of a result as typed lines.
pub(crate) fn report_details(output: &mut OutputLog, result: &TaskInvocationResult) {
    for warning in &result.warnings {
        output.warning(warning.clone());
    }
    for error in &result.errors {
        output.error(error.clone());
    }
}

/// Append the final success / error line of a result.
pub(crate) fn report_outcome(output: &mut OutputLog, result: &TaskInvocationResult) {
    let line = if result.is_success() {
        OutputLine::success(result.message.clone())
    } else {
        let line = OutputLine::error(result.message.clone());
        match &result.exception {
            Some(exception) => line.with_exception(exception.clone()),
            None => line,
        }
    };
    output.push(line);
}

/// Compile exclude globs. Patterns are matched against paths relative to
/// the folder being walked.
pub(crate) fn build_excludes(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("invalid glob pattern '{pattern}'"))?;
        builder.add(glob);
    }
    builder.build().context("building exclude pattern set")
}
