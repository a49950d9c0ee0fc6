#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use acsbuild::context::{ContextBag, InvocationContext};
use acsbuild::engine::Profile;
use acsbuild::fs::FileSystem;
use acsbuild::task::TaskDefinition;
use acsbuild::types::ErrorBehavior;

use crate::fake_handler::fake_task;

/// Builder for `Profile` to simplify test setup.
pub struct ProfileBuilder {
    profile: Profile,
}

impl ProfileBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            profile: Profile::new(name),
        }
    }

    pub fn task(mut self, task: Arc<TaskDefinition>, behavior: ErrorBehavior) -> Self {
        self.profile = self.profile.with_task(task, behavior);
        self
    }

    /// Fake task that halts the profile if it fails.
    pub fn stop(self, name: &str) -> Self {
        self.task(fake_task(name), ErrorBehavior::StopOnError)
    }

    /// Fake task the profile runs past if it fails.
    pub fn dont_stop(self, name: &str) -> Self {
        self.task(fake_task(name), ErrorBehavior::DontStop)
    }

    pub fn build(self) -> Profile {
        self.profile
    }
}

/// Builder for `InvocationContext`.
pub struct ContextBuilder {
    project_dir: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    bag: ContextBag,
    fs: Option<Arc<dyn FileSystem>>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            project_dir: None,
            working_dir: None,
            bag: ContextBag::new(),
            fs: None,
        }
    }

    pub fn project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn tool(mut self, key: &str, path: impl AsRef<Path>) -> Self {
        self.bag = self.bag.with_path(key, path.as_ref());
        self
    }

    /// Store a flag under `key`, e.g. to put a wrong-typed value where a
    /// path is expected.
    pub fn flag(mut self, key: &str, value: bool) -> Self {
        self.bag = self.bag.with_flag(key, value);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    pub fn build(self) -> InvocationContext {
        let mut ctx = InvocationContext::new(self.project_dir, Arc::new(self.bag));
        if let Some(dir) = self.working_dir {
            ctx = ctx.with_working_directory(dir);
        }
        if let Some(fs) = self.fs {
            ctx = ctx.with_file_system(fs);
        }
        ctx
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
