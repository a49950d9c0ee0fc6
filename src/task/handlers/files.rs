// src/task/handlers/files.rs

//! File housekeeping tasks.
//!
//! These go through the context's [`FileSystem`](crate::fs::FileSystem), so
//! they run the same against the real disk and an in-memory mock.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::context::InvocationContext;
use crate::fs::{walk_files, FileSystem};
use crate::result::TaskInvocationResult;
use crate::task::handlers::{build_excludes, report_outcome};
use crate::task::{
    CopyProjectTask, DeleteFileTask, FileTransferTask, HandlerFuture, OutputLog, TaskDefinition,
    TaskHandler, TaskKind,
};

#[derive(Debug, Clone)]
enum FileOp {
    Copy(FileTransferTask),
    Move(FileTransferTask),
    Delete(DeleteFileTask),
}

pub fn factory(task: &Arc<TaskDefinition>) -> Option<Box<dyn TaskHandler>> {
    let op = match &task.kind {
        TaskKind::CopyFile(p) => FileOp::Copy(p.clone()),
        TaskKind::MoveFile(p) => FileOp::Move(p.clone()),
        TaskKind::DeleteFile(p) => FileOp::Delete(p.clone()),
        _ => return None,
    };
    Some(Box::new(FileHandler { op }))
}

pub fn copy_project_factory(task: &Arc<TaskDefinition>) -> Option<Box<dyn TaskHandler>> {
    match &task.kind {
        TaskKind::CopyProject(params) => Some(Box::new(CopyProjectHandler {
            params: params.clone(),
        })),
        _ => None,
    }
}

/// Copy, move or delete a single file.
pub struct FileHandler {
    op: FileOp,
}

impl TaskHandler for FileHandler {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut InvocationContext,
        output: &'a mut OutputLog,
        cancel: &'a CancellationToken,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let result = if cancel.is_cancelled() {
                TaskInvocationResult::cancelled()
            } else {
                match &self.op {
                    FileOp::Copy(p) => transfer(ctx, p, false),
                    FileOp::Move(p) => transfer(ctx, p, true),
                    FileOp::Delete(p) => delete(ctx, p),
                }
            };
            for warning in &result.warnings {
                output.warning(warning.clone());
            }
            report_outcome(output, &result);
            result
        })
    }
}

fn transfer(ctx: &InvocationContext, params: &FileTransferTask, remove_source: bool) -> TaskInvocationResult {
    let fs = ctx.fs();
    let source = ctx.resolve(&params.source);
    let target = ctx.resolve(&params.target);
    let verb = if remove_source { "move" } else { "copy" };

    if !fs.is_file(&source) {
        return TaskInvocationResult::failure(format!(
            "Cannot {verb} '{}': source file does not exist",
            ctx.display_relative(&source)
        ));
    }
    if fs.exists(&target) && !params.overwrite {
        return TaskInvocationResult::failure(format!(
            "Cannot {verb} to '{}': target already exists and overwrite is disabled",
            ctx.display_relative(&target)
        ));
    }

    let outcome = if remove_source {
        move_file(fs, &source, &target)
    } else {
        fs.copy_file(&source, &target)
    };

    match outcome {
        Ok(()) => {
            debug!(from = %source.display(), to = %target.display(), verb, "file transferred");
            let done = if remove_source { "Moved" } else { "Copied" };
            TaskInvocationResult::success(format!(
                "{done} '{}' to '{}'",
                ctx.display_relative(&source),
                ctx.display_relative(&target)
            ))
        }
        Err(err) => TaskInvocationResult::from_error(
            format!(
                "Could not {verb} '{}' to '{}'",
                ctx.display_relative(&source),
                ctx.display_relative(&target)
            ),
            err,
        ),
    }
}

/// Rename when possible; fall back to copy + delete (e.g. across devices).
/// Both replace an existing target in place, so a failed move leaves it
/// untouched.
fn move_file(fs: &dyn FileSystem, source: &Path, target: &Path) -> anyhow::Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs.create_dir_all(parent)?;
    }
    match fs.rename(source, target) {
        Ok(()) => Ok(()),
        Err(err) => {
            debug!(error = %err, "rename failed, copying instead");
            fs.copy_file(source, target)?;
            fs.remove_file(source)
        }
    }
}

fn delete(ctx: &InvocationContext, params: &DeleteFileTask) -> TaskInvocationResult {
    let path = ctx.resolve(&params.path);
    let shown = ctx.display_relative(&path);

    if !ctx.fs().exists(&path) {
        return TaskInvocationResult::success(format!("Nothing to delete at '{shown}'"))
            .with_warnings(vec![format!("File '{shown}' does not exist")]);
    }

    match ctx.fs().remove_file(&path) {
        Ok(()) => TaskInvocationResult::success(format!("Deleted '{shown}'")),
        Err(err) => TaskInvocationResult::from_error(format!("Could not delete '{shown}'"), err),
    }
}

/// Copy the project directory somewhere else and, by default, make that
/// copy the working directory of every task after this one.
pub struct CopyProjectHandler {
    params: CopyProjectTask,
}

impl TaskHandler for CopyProjectHandler {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut InvocationContext,
        output: &'a mut OutputLog,
        cancel: &'a CancellationToken,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let result = self.copy(ctx, output, cancel).await;
            report_outcome(output, &result);
            result
        })
    }
}

impl CopyProjectHandler {
    async fn copy(
        &self,
        ctx: &mut InvocationContext,
        output: &mut OutputLog,
        cancel: &CancellationToken,
    ) -> TaskInvocationResult {
        let Some(project) = ctx.project_directory().map(Path::to_path_buf) else {
            return TaskInvocationResult::failure("Project directory is not set");
        };
        let target = ctx.resolve(&self.params.target);
        let excludes = self.params.exclude.clone();
        let fs = ctx.shared_fs();

        let copy = {
            let project = project.clone();
            let target = target.clone();
            tokio::task::spawn_blocking(move || copy_tree(fs.as_ref(), &project, &target, &excludes))
        };

        let copied = tokio::select! {
            joined = copy => match joined {
                Ok(Ok(copied)) => copied,
                Ok(Err(err)) => {
                    return TaskInvocationResult::from_error("Could not copy the project", err);
                }
                Err(join_err) => {
                    return TaskInvocationResult::from_error("Project copy did not finish", join_err);
                }
            },
            // The blocking copy keeps going in the background; the next
            // task never starts, so nothing observes a half-copied tree.
            _ = cancel.cancelled() => return TaskInvocationResult::cancelled(),
        };

        output.message(format!("Copied {copied} file(s) to {}", target.display()));
        info!(from = %project.display(), to = %target.display(), files = copied, "project copied");

        if self.params.set_working_directory {
            ctx.set_working_directory(target.clone());
            output.message(format!("Working directory is now {}", target.display()));
        }

        TaskInvocationResult::success(format!("Copied project to {}", target.display()))
    }
}

/// Copy every file below `root` into `target`, keeping relative layout.
/// Files matching an exclude glob and anything already inside `target` are
/// skipped. Returns the number of copied files.
fn copy_tree(
    fs: &dyn FileSystem,
    root: &Path,
    target: &Path,
    exclude: &[String],
) -> anyhow::Result<usize> {
    let excludes = build_excludes(exclude)?;
    let mut copied = 0;

    for file in walk_files(fs, root)? {
        if file.starts_with(target) {
            continue;
        }
        let rel: PathBuf = file
            .strip_prefix(root)
            .with_context(|| format!("{} is not below {}", file.display(), root.display()))?
            .to_path_buf();
        if excludes.is_match(&rel) {
            debug!(file = %rel.display(), "excluded from project copy");
            continue;
        }
        fs.copy_file(&file, &target.join(&rel))?;
        copied += 1;
    }

    Ok(copied)
}
