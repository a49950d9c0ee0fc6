// src/config/mod.rs

//! Project file loading and validation.
//!
//! - `model.rs`: the TOML-backed data model and the conversions into
//!   profiles and an invocation context.
//! - `loader.rs`: read a project file from disk.
//! - `validate.rs`: structural checks (`RawProjectFile` -> `ProjectFile`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    default_config_path, load_and_validate, load_from_path, parse_and_validate, parse_raw,
};
pub use model::{
    ProfileEntryConfig, ProfileSection, ProjectFile, RawProjectFile, SettingsSection, ToolsSection,
};
pub use validate::validate_raw_project;
