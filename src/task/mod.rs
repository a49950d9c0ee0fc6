// src/task/mod.rs

//! Task abstraction layer.
//!
//! - [`TaskDefinition`] is one configured unit of work: a display name plus a
//!   typed [`TaskKind`] carrying that kind's parameters.
//! - [`Runnable`] / [`Validatable`] are the capabilities the orchestrator
//!   relies on; every definition implements both.
//! - [`TaskHandler`] is the run-time object produced per invocation by the
//!   [`HandlerRegistry`] for a task's [`HandlerKind`].
//! - [`OutputLog`] is the append-only line log of one task run.

pub mod handlers;
pub mod output_log;
pub mod params;
pub mod registry;
pub mod validate;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::context::InvocationContext;
use crate::errors::Result;
use crate::result::{TaskInvocationResult, ValidateResult};

pub use output_log::OutputLog;
pub use params::*;
pub use registry::{HandlerFactory, HandlerRegistry};

/// Stable identifier selecting the handler that runs a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandlerKind {
    AccCompile,
    BccCompile,
    GdccAccCompile,
    GdccCcCompile,
    GdccLink,
    GdccMakeLib,
    GdccBuild,
    RunInVm,
    CopyFile,
    MoveFile,
    DeleteFile,
    CopyProject,
    ZipFolder,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 13] = [
        HandlerKind::AccCompile,
        HandlerKind::BccCompile,
        HandlerKind::GdccAccCompile,
        HandlerKind::GdccCcCompile,
        HandlerKind::GdccLink,
        HandlerKind::GdccMakeLib,
        HandlerKind::GdccBuild,
        HandlerKind::RunInVm,
        HandlerKind::CopyFile,
        HandlerKind::MoveFile,
        HandlerKind::DeleteFile,
        HandlerKind::CopyProject,
        HandlerKind::ZipFolder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HandlerKind::AccCompile => "acc_compile",
            HandlerKind::BccCompile => "bcc_compile",
            HandlerKind::GdccAccCompile => "gdcc_acc_compile",
            HandlerKind::GdccCcCompile => "gdcc_cc_compile",
            HandlerKind::GdccLink => "gdcc_link",
            HandlerKind::GdccMakeLib => "gdcc_make_lib",
            HandlerKind::GdccBuild => "gdcc_build",
            HandlerKind::RunInVm => "run_in_vm",
            HandlerKind::CopyFile => "copy_file",
            HandlerKind::MoveFile => "move_file",
            HandlerKind::DeleteFile => "delete_file",
            HandlerKind::CopyProject => "copy_project",
            HandlerKind::ZipFolder => "zip_folder",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task parameters, tagged by `kind` in the project file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskKind {
    AccCompile(AccCompileTask),
    BccCompile(BccCompileTask),
    GdccAccCompile(GdccCompileTask),
    GdccCcCompile(GdccCompileTask),
    GdccLink(GdccLinkTask),
    GdccMakeLib(GdccMakeLibTask),
    GdccBuild(GdccBuildTask),
    RunInVm(RunInVmTask),
    CopyFile(FileTransferTask),
    MoveFile(FileTransferTask),
    DeleteFile(DeleteFileTask),
    CopyProject(CopyProjectTask),
    ZipFolder(ZipFolderTask),
}

impl TaskKind {
    pub fn handler_kind(&self) -> HandlerKind {
        match self {
            TaskKind::AccCompile(_) => HandlerKind::AccCompile,
            TaskKind::BccCompile(_) => HandlerKind::BccCompile,
            TaskKind::GdccAccCompile(_) => HandlerKind::GdccAccCompile,
            TaskKind::GdccCcCompile(_) => HandlerKind::GdccCcCompile,
            TaskKind::GdccLink(_) => HandlerKind::GdccLink,
            TaskKind::GdccMakeLib(_) => HandlerKind::GdccMakeLib,
            TaskKind::GdccBuild(_) => HandlerKind::GdccBuild,
            TaskKind::RunInVm(_) => HandlerKind::RunInVm,
            TaskKind::CopyFile(_) => HandlerKind::CopyFile,
            TaskKind::MoveFile(_) => HandlerKind::MoveFile,
            TaskKind::DeleteFile(_) => HandlerKind::DeleteFile,
            TaskKind::CopyProject(_) => HandlerKind::CopyProject,
            TaskKind::ZipFolder(_) => HandlerKind::ZipFolder,
        }
    }
}

/// One configured unit of work, shared (`Arc`) by every profile using it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub name: String,
    pub kind: TaskKind,
}

impl TaskDefinition {
    pub fn new(name: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// What the orchestrator needs to find a handler for a task.
pub trait Runnable {
    fn handler_kind(&self) -> HandlerKind;
    fn name(&self) -> &str;
}

/// Static pre-run checks. Must not touch anything but reads.
pub trait Validatable {
    fn validate(&self, ctx: &InvocationContext) -> Vec<ValidateResult>;
}

impl Runnable for TaskDefinition {
    fn handler_kind(&self) -> HandlerKind {
        self.kind.handler_kind()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Validatable for TaskDefinition {
    fn validate(&self, ctx: &InvocationContext) -> Vec<ValidateResult> {
        validate::validate_kind(&self.kind, ctx)
    }
}

/// Boxed future returned by [`TaskHandler::handle`].
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = TaskInvocationResult> + Send + 'a>>;

/// Run-time executor of one task.
///
/// Handlers never return `Err`: every failure of the work itself becomes a
/// [`TaskInvocationResult`] of type `Error`. Configuration problems are
/// reported up front through [`check_context`](TaskHandler::check_context).
pub trait TaskHandler: Send + Sync {
    /// Verify the configuration this handler depends on (tool paths in the
    /// context bag). Called for every task before the first one runs.
    fn check_context(&self, _ctx: &InvocationContext) -> Result<()> {
        Ok(())
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut InvocationContext,
        output: &'a mut OutputLog,
        cancel: &'a CancellationToken,
    ) -> HandlerFuture<'a>;
}
