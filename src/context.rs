// src/context.rs

//! Per-run invocation context shared by every task of one profile run.
//!
//! The context owns the only state tasks may mutate for the benefit of later
//! tasks (the working directory). Tool paths live in a [`ContextBag`] that is
//! read-only for the duration of a run and is shared by `Arc`, so several
//! concurrent runs built from the same configuration snapshot can point at the
//! same bag while each keeps its own working directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{AcsBuildError, Result};
use crate::fs::{FileSystem, RealFileSystem};

/// Well-known [`ContextBag`] keys.
pub mod keys {
    pub const ACC_COMPILER: &str = "AccCompilerExecutableFilePath";
    pub const BCC_COMPILER: &str = "BccCompilerExecutableFilePath";
    pub const GDCC_ACC_COMPILER: &str = "GdccAccCompilerExecutableFilePath";
    pub const GDCC_CC_COMPILER: &str = "GdccCcCompilerExecutableFilePath";
    pub const GDCC_LINKER: &str = "GdccLdExecutableFilePath";
    pub const GDCC_MAKELIB: &str = "GdccMakeLibExecutableFilePath";
    pub const ACS_VM: &str = "AcsVmExecutableFilePath";
    /// Root under which per-task stdout/stderr capture files are written.
    pub const TEMP_DIRECTORY: &str = "TemporaryDirectoryPath";
}

/// A typed configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextValue {
    Text(String),
    Path(PathBuf),
    Flag(bool),
}

impl ContextValue {
    fn type_name(&self) -> &'static str {
        match self {
            ContextValue::Text(_) => "text",
            ContextValue::Path(_) => "path",
            ContextValue::Flag(_) => "flag",
        }
    }
}

/// String-keyed configuration map (tool executable paths and friends).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBag {
    values: BTreeMap<String, ContextValue>,
}

impl ContextBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ContextValue) {
        self.values.insert(key.into(), value);
    }

    pub fn with_path(mut self, key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.insert(key, ContextValue::Path(path.into()));
        self
    }

    pub fn with_flag(mut self, key: impl Into<String>, flag: bool) -> Self {
        self.insert(key, ContextValue::Flag(flag));
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Result<&ContextValue> {
        self.values
            .get(key)
            .ok_or_else(|| AcsBuildError::MissingContextKey(key.to_string()))
    }

    /// Look up a path. Text values are accepted too, since tool paths are
    /// often configured as plain strings.
    pub fn get_path(&self, key: &str) -> Result<&Path> {
        match self.get(key)? {
            ContextValue::Path(p) => Ok(p.as_path()),
            ContextValue::Text(s) => Ok(Path::new(s.as_str())),
            other => Err(wrong_type(key, "path", other)),
        }
    }

    /// Like [`get_path`](Self::get_path) but a missing key is `Ok(None)`.
    pub fn get_optional_path(&self, key: &str) -> Result<Option<&Path>> {
        match self.get_path(key) {
            Ok(p) => Ok(Some(p)),
            Err(AcsBuildError::MissingContextKey(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &ContextValue) -> AcsBuildError {
    AcsBuildError::WrongContextType {
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}

/// Mutable state threaded through every handler of one profile run.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    project_directory: Option<PathBuf>,
    working_directory: Option<PathBuf>,
    bag: Arc<ContextBag>,
    fs: Arc<dyn FileSystem>,
}

impl InvocationContext {
    pub fn new(project_directory: Option<PathBuf>, bag: Arc<ContextBag>) -> Self {
        Self {
            working_directory: project_directory.clone(),
            project_directory,
            bag,
            fs: Arc::new(RealFileSystem),
        }
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn project_directory(&self) -> Option<&Path> {
        self.project_directory.as_deref()
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    /// Redirect all following tasks to a different directory.
    pub fn set_working_directory(&mut self, dir: impl Into<PathBuf>) {
        self.working_directory = Some(dir.into());
    }

    pub fn bag(&self) -> &ContextBag {
        &self.bag
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn shared_fs(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    /// Directory that relative task paths are resolved against: the working
    /// directory, else the project directory.
    pub fn base_directory(&self) -> Option<&Path> {
        self.working_directory().or(self.project_directory())
    }

    /// Resolve a task path against [`base_directory`](Self::base_directory).
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.base_directory() {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Render `path` relative to the project directory when possible, for
    /// user-facing messages.
    pub fn display_relative(&self, path: &Path) -> String {
        let stripped = self
            .base_directory()
            .and_then(|base| path.strip_prefix(base).ok())
            .or_else(|| {
                self.project_directory()
                    .and_then(|base| path.strip_prefix(base).ok())
            });
        match stripped {
            Some(rel) => rel.display().to_string(),
            None => path.display().to_string(),
        }
    }
}
