// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::context::{keys, ContextBag, InvocationContext};
use crate::engine::Profile;
use crate::errors::{AcsBuildError, Result};
use crate::task::{TaskDefinition, TaskKind};
use crate::types::ErrorBehavior;

/// Project file exactly as deserialized from TOML.
///
/// ```toml
/// [settings]
/// working_directory = "build"
/// temp_directory = ".acsbuild/tmp"
///
/// [tools]
/// acc = "/opt/acc/acc"
///
/// [task.main]
/// kind = "acc_compile"
/// input = "src/main.acs"
/// output = "acs/main.o"
///
/// [profile.release]
/// tasks = ["main", { task = "pack", error_behavior = "dont_stop" }]
/// ```
///
/// All sections are optional here; [`ProjectFile`] enforces the rest.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawProjectFile {
    #[serde(default)]
    pub settings: SettingsSection,

    #[serde(default)]
    pub tools: ToolsSection,

    /// `[task.<name>]` sections, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskKind>,

    /// `[profile.<name>]` sections, keyed by profile name.
    #[serde(default)]
    pub profile: BTreeMap<String, ProfileSection>,
}

/// `[settings]` section. Relative paths are resolved against the directory
/// holding the project file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SettingsSection {
    /// Defaults to the project file's directory.
    #[serde(default)]
    pub project_directory: Option<PathBuf>,

    /// Initial working directory of every run; defaults to the project
    /// directory.
    #[serde(default)]
    pub working_directory: Option<PathBuf>,

    /// Root for per-task stdout/stderr capture files. No capture if unset.
    #[serde(default)]
    pub temp_directory: Option<PathBuf>,
}

/// `[tools]` section: executable of each external tool.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolsSection {
    #[serde(default)]
    pub acc: Option<PathBuf>,
    #[serde(default)]
    pub bcc: Option<PathBuf>,
    #[serde(default)]
    pub gdcc_acc: Option<PathBuf>,
    #[serde(default)]
    pub gdcc_cc: Option<PathBuf>,
    #[serde(default)]
    pub gdcc_ld: Option<PathBuf>,
    #[serde(default)]
    pub gdcc_makelib: Option<PathBuf>,
    #[serde(default)]
    pub acs_vm: Option<PathBuf>,
}

impl ToolsSection {
    /// `(context key, configured path)` for every tool.
    pub fn entries(&self) -> [(&'static str, Option<&PathBuf>); 7] {
        [
            (keys::ACC_COMPILER, self.acc.as_ref()),
            (keys::BCC_COMPILER, self.bcc.as_ref()),
            (keys::GDCC_ACC_COMPILER, self.gdcc_acc.as_ref()),
            (keys::GDCC_CC_COMPILER, self.gdcc_cc.as_ref()),
            (keys::GDCC_LINKER, self.gdcc_ld.as_ref()),
            (keys::GDCC_MAKELIB, self.gdcc_makelib.as_ref()),
            (keys::ACS_VM, self.acs_vm.as_ref()),
        ]
    }
}

/// `[profile.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileSection {
    #[serde(default)]
    pub tasks: Vec<ProfileEntryConfig>,
}

/// One entry of `profile.<name>.tasks`: either a bare task name (stop on
/// error) or a table with an explicit error behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProfileEntryConfig {
    Name(String),
    Detailed {
        task: String,
        #[serde(default)]
        error_behavior: ErrorBehavior,
    },
}

impl ProfileEntryConfig {
    pub fn task_name(&self) -> &str {
        match self {
            ProfileEntryConfig::Name(name) => name,
            ProfileEntryConfig::Detailed { task, .. } => task,
        }
    }

    pub fn error_behavior(&self) -> ErrorBehavior {
        match self {
            ProfileEntryConfig::Name(_) => ErrorBehavior::default(),
            ProfileEntryConfig::Detailed { error_behavior, .. } => *error_behavior,
        }
    }
}

/// Validated project. Only built through `TryFrom<RawProjectFile>`.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    root: PathBuf,
    pub settings: SettingsSection,
    pub tools: ToolsSection,
    tasks: BTreeMap<String, Arc<TaskDefinition>>,
    profiles: BTreeMap<String, Vec<ProfileEntryConfig>>,
}

impl ProjectFile {
    pub(crate) fn new_unchecked(raw: RawProjectFile) -> Self {
        let tasks = raw
            .task
            .into_iter()
            .map(|(name, kind)| {
                let task = Arc::new(TaskDefinition::new(name.clone(), kind));
                (name, task)
            })
            .collect();
        let profiles = raw
            .profile
            .into_iter()
            .map(|(name, section)| (name, section.tasks))
            .collect();

        Self {
            root: PathBuf::from("."),
            settings: raw.settings,
            tools: raw.tools,
            tasks,
            profiles,
        }
    }

    /// Directory relative settings are resolved against (normally the
    /// directory holding the project file).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_directory(&self) -> PathBuf {
        match &self.settings.project_directory {
            Some(dir) => self.root.join(dir),
            None => self.root.clone(),
        }
    }

    pub fn working_directory(&self) -> PathBuf {
        let project = self.project_directory();
        match &self.settings.working_directory {
            Some(dir) => project.join(dir),
            None => project,
        }
    }

    pub fn task(&self, name: &str) -> Option<&Arc<TaskDefinition>> {
        self.tasks.get(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Arc<TaskDefinition>> {
        self.tasks.values()
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Build the runnable profile `name`. Task definitions are shared, not
    /// copied, between profiles.
    pub fn profile(&self, name: &str) -> Result<Profile> {
        let entries = self
            .profiles
            .get(name)
            .ok_or_else(|| AcsBuildError::ProfileNotFound(name.to_string()))?;

        let mut profile = Profile::new(name);
        for entry in entries {
            let task = self.tasks.get(entry.task_name()).ok_or_else(|| {
                AcsBuildError::ConfigError(format!(
                    "profile '{name}' references unknown task '{}'",
                    entry.task_name()
                ))
            })?;
            profile = profile.with_task(Arc::clone(task), entry.error_behavior());
        }
        Ok(profile)
    }

    /// Tool paths and the capture root under their well-known keys.
    ///
    /// Tool paths containing a separator are resolved against the project
    /// directory; bare names are left for `PATH` lookup.
    pub fn context_bag(&self) -> ContextBag {
        let project = self.project_directory();
        let mut bag = ContextBag::new();

        for (key, path) in self.tools.entries() {
            if let Some(path) = path {
                let resolved = if path.components().count() > 1 || path.is_absolute() {
                    project.join(path)
                } else {
                    path.clone()
                };
                bag = bag.with_path(key, resolved);
            }
        }

        if let Some(temp) = &self.settings.temp_directory {
            bag = bag.with_path(keys::TEMP_DIRECTORY, project.join(temp));
        }

        bag
    }

    /// Fresh context for one profile run.
    pub fn invocation_context(&self) -> InvocationContext {
        InvocationContext::new(Some(self.project_directory()), Arc::new(self.context_bag()))
            .with_working_directory(self.working_directory())
    }
}
