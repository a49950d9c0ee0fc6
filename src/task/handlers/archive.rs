// src/task/handlers/archive.rs

//! Packs a folder into a `.zip` / `.pk3` archive.
//!
//! Entry names are relative to the folder and always use `/` separators.
//! The archive is assembled in memory and written through the context's
//! file system in one go.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::context::InvocationContext;
use crate::fs::{walk_files, FileSystem};
use crate::result::TaskInvocationResult;
use crate::task::handlers::{build_excludes, report_outcome};
use crate::task::{HandlerFuture, OutputLog, TaskDefinition, TaskHandler, TaskKind, ZipFolderTask};

pub fn factory(task: &Arc<TaskDefinition>) -> Option<Box<dyn TaskHandler>> {
    match &task.kind {
        TaskKind::ZipFolder(params) => Some(Box::new(ZipFolderHandler {
            params: params.clone(),
        })),
        _ => None,
    }
}

pub struct ZipFolderHandler {
    params: ZipFolderTask,
}

impl TaskHandler for ZipFolderHandler {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut InvocationContext,
        output: &'a mut OutputLog,
        cancel: &'a CancellationToken,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let result = self.pack(ctx, output, cancel).await;
            report_outcome(output, &result);
            result
        })
    }
}

impl ZipFolderHandler {
    async fn pack(
        &self,
        ctx: &InvocationContext,
        output: &mut OutputLog,
        cancel: &CancellationToken,
    ) -> TaskInvocationResult {
        let folder = ctx.resolve(&self.params.folder);
        let archive = ctx.resolve(&self.params.output);

        if !ctx.fs().is_dir(&folder) {
            return TaskInvocationResult::failure(format!(
                "Folder '{}' does not exist",
                ctx.display_relative(&folder)
            ));
        }

        let fs = ctx.shared_fs();
        let excludes = self.params.exclude.clone();
        let job = {
            let folder = folder.clone();
            let archive = archive.clone();
            tokio::task::spawn_blocking(move || write_archive(fs.as_ref(), &folder, &archive, &excludes))
        };

        let entries = tokio::select! {
            joined = job => match joined {
                Ok(Ok(entries)) => entries,
                Ok(Err(err)) => {
                    return TaskInvocationResult::from_error(
                        format!("Could not create archive '{}'", ctx.display_relative(&archive)),
                        err,
                    );
                }
                Err(join_err) => {
                    return TaskInvocationResult::from_error("Archiving did not finish", join_err);
                }
            },
            _ = cancel.cancelled() => return TaskInvocationResult::cancelled(),
        };

        info!(folder = %folder.display(), archive = %archive.display(), entries, "archive written");
        output.message(format!("Packed {entries} file(s)"));
        TaskInvocationResult::success(format!(
            "Created archive '{}'",
            ctx.display_relative(&archive)
        ))
    }
}

/// Zip every non-excluded file under `folder` into `archive`. Returns the
/// number of entries written.
fn write_archive(
    fs: &dyn FileSystem,
    folder: &Path,
    archive: &Path,
    exclude: &[String],
) -> anyhow::Result<usize> {
    let excludes = build_excludes(exclude)?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = 0;

    for file in walk_files(fs, folder)? {
        if file == archive {
            continue;
        }
        let rel: PathBuf = file
            .strip_prefix(folder)
            .with_context(|| format!("{} is not below {}", file.display(), folder.display()))?
            .to_path_buf();
        if excludes.is_match(&rel) {
            debug!(file = %rel.display(), "excluded from archive");
            continue;
        }

        let name = entry_name(&rel);
        let contents = fs.read(&file)?;
        zip.start_file(name.as_str(), options)
            .with_context(|| format!("adding {name} to archive"))?;
        zip.write_all(&contents)
            .with_context(|| format!("writing {name} to archive"))?;
        entries += 1;
    }

    let bytes = zip.finish().context("finishing archive")?.into_inner();
    fs.write(archive, &bytes)?;
    Ok(entries)
}

fn entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
