// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::Result;

/// Read and deserialize a project file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawProjectFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_raw(&contents)
}

pub fn parse_raw(contents: &str) -> Result<RawProjectFile> {
    let project: RawProjectFile = toml::from_str(contents)?;
    Ok(project)
}

/// Load a project file and validate it.
///
/// Relative settings in the file are resolved against the file's own
/// directory, so `acsbuild --project sub/acsbuild.toml` behaves the same as
/// running from inside `sub/`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ProjectFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let project = ProjectFile::try_from(raw)?;
    Ok(project.with_root(project_root_dir(path)))
}

/// Parse and validate project TOML held in memory, rooted at `root`.
pub fn parse_and_validate(contents: &str, root: impl Into<PathBuf>) -> Result<ProjectFile> {
    let project = ProjectFile::try_from(parse_raw(contents)?)?;
    Ok(project.with_root(root))
}

/// `acsbuild.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("acsbuild.toml")
}

/// Directory holding the project file; `.` for a bare file name.
fn project_root_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
