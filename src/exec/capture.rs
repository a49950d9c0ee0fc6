// src/exec/capture.rs

//! Optional on-disk copies of a task's stdout / stderr.
//!
//! Files land in `<temp root>/<task name>/stdout.log` and `stderr.log`, where
//! the temp root is the `TemporaryDirectoryPath` entry of the context bag.
//! Capture is best effort: failing to write a capture file is logged and
//! never fails the task.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::context::{keys, InvocationContext};
use crate::errors;

#[derive(Debug, Clone)]
pub struct CaptureDir {
    dir: PathBuf,
}

impl CaptureDir {
    /// Capture directory for `task_name`, or `None` if no temp root is
    /// configured. A wrong-typed temp root is a configuration error.
    pub fn for_task(ctx: &InvocationContext, task_name: &str) -> errors::Result<Option<Self>> {
        let Some(root) = ctx.bag().get_optional_path(keys::TEMP_DIRECTORY)? else {
            return Ok(None);
        };
        let root = ctx.resolve(root);
        Ok(Some(Self {
            dir: root.join(sanitize_task_name(task_name)),
        }))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stdout_path(&self) -> PathBuf {
        self.dir.join("stdout.log")
    }

    pub fn stderr_path(&self) -> PathBuf {
        self.dir.join("stderr.log")
    }

    pub async fn save(&self, stdout: &[u8], stderr: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating capture dir {:?}", self.dir))?;
        tokio::fs::write(self.stdout_path(), stdout)
            .await
            .with_context(|| format!("writing {:?}", self.stdout_path()))?;
        tokio::fs::write(self.stderr_path(), stderr)
            .await
            .with_context(|| format!("writing {:?}", self.stderr_path()))?;
        debug!(dir = %self.dir.display(), "saved process output capture");
        Ok(())
    }

    /// Like [`save`](Self::save) but logs instead of failing.
    pub async fn save_or_warn(&self, stdout: &[u8], stderr: &[u8]) {
        if let Err(err) = self.save(stdout, stderr).await {
            warn!(dir = %self.dir.display(), error = %err, "failed to save process output capture");
        }
    }
}

/// Collects decoded lines of a line-oriented run so they can be captured
/// after the process exits.
#[derive(Debug, Default)]
pub struct LineCapture {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl LineCapture {
    pub fn push(&mut self, kind: super::StreamKind, line: &str) {
        let buf = match kind {
            super::StreamKind::Stdout => &mut self.stdout,
            super::StreamKind::Stderr => &mut self.stderr,
        };
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }
}

/// Turn a task display name into a single safe path component.
///
/// ASCII letters, digits, `-` and `_` are kept; every other byte becomes
/// `%XX`. Since `%` is always escaped, distinct names never share a
/// directory.
pub fn sanitize_task_name(name: &str) -> String {
    if name.is_empty() {
        return "%".to_string();
    }
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
