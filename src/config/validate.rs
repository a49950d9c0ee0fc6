// src/config/validate.rs

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::{AcsBuildError, Result};

impl TryFrom<RawProjectFile> for ProjectFile {
    type Error = AcsBuildError;

    fn try_from(raw: RawProjectFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_project(&raw)?;
        Ok(ProjectFile::new_unchecked(raw))
    }
}

/// Structural checks on a freshly parsed project file.
///
/// Task parameters (paths, extensions) are not checked here; that is the
/// per-task validation pass, which needs an invocation context.
pub fn validate_raw_project(project: &RawProjectFile) -> Result<()> {
    ensure_has_tasks(project)?;
    validate_names(project)?;
    validate_profiles(project)?;
    Ok(())
}

fn ensure_has_tasks(project: &RawProjectFile) -> Result<()> {
    if project.task.is_empty() {
        return Err(AcsBuildError::ConfigError(
            "project must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_names(project: &RawProjectFile) -> Result<()> {
    if project.task.keys().any(|name| name.trim().is_empty()) {
        return Err(AcsBuildError::ConfigError(
            "task names must not be empty".to_string(),
        ));
    }
    if project.profile.keys().any(|name| name.trim().is_empty()) {
        return Err(AcsBuildError::ConfigError(
            "profile names must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_profiles(project: &RawProjectFile) -> Result<()> {
    for (name, profile) in project.profile.iter() {
        if profile.tasks.is_empty() {
            return Err(AcsBuildError::ConfigError(format!(
                "profile '{name}' has no tasks"
            )));
        }

        for entry in profile.tasks.iter() {
            let task = entry.task_name();
            if !project.task.contains_key(task) {
                return Err(AcsBuildError::ConfigError(format!(
                    "profile '{name}' references unknown task '{task}'"
                )));
            }
        }
    }
    Ok(())
}
