mod common;
use crate::common::{init_tracing, with_timeout, TestResult};

use std::path::Path;

use acsbuild::cli::CliArgs;
use acsbuild::types::RunStatus;

const PROJECT: &str = r#"
[task.stage]
kind = "copy_project"
target = "staging"
exclude = ["acsbuild.toml", "*.tmp"]

[task.cleanup]
kind = "delete_file"
path = "scratch.tmp"

[task.pack]
kind = "zip_folder"
folder = "pk3"
output = "mod.pk3"

[task.broken]
kind = "copy_file"
source = "missing.txt"
target = "copy.txt"

[profile.release]
tasks = ["stage", "pack"]

[profile.lenient]
tasks = [{ task = "broken", error_behavior = "dont_stop" }, "cleanup"]

[profile.strict]
tasks = ["broken", "cleanup"]
"#;

fn write_project(root: &Path) -> std::io::Result<()> {
    std::fs::write(root.join("acsbuild.toml"), PROJECT)?;
    std::fs::create_dir_all(root.join("pk3/acs"))?;
    std::fs::write(root.join("pk3/acs/main.o"), "object")?;
    std::fs::write(root.join("scratch.tmp"), "scratch")?;
    Ok(())
}

fn args(root: &Path, profile: &str) -> CliArgs {
    CliArgs {
        project: root.join("acsbuild.toml").display().to_string(),
        profile: Some(profile.to_string()),
        list: false,
        validate_only: false,
        dry_run: false,
        force: true,
        log_level: None,
    }
}

#[tokio::test]
async fn test_release_profile_stages_then_packs_the_copy() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    write_project(dir.path())?;

    let status = with_timeout(acsbuild::run(args(dir.path(), "release"))).await?;

    assert_eq!(status, RunStatus::Success);
    // Packing ran inside the staged copy.
    assert!(dir.path().join("staging/pk3/acs/main.o").is_file());
    assert!(dir.path().join("staging/mod.pk3").is_file());
    assert!(!dir.path().join("mod.pk3").exists());
    assert!(!dir.path().join("staging/scratch.tmp").exists());
    Ok(())
}

#[tokio::test]
async fn test_dont_stop_entry_lets_the_profile_succeed() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_project(dir.path())?;

    let status = acsbuild::run(args(dir.path(), "lenient")).await?;

    assert_eq!(status, RunStatus::Success);
    assert!(!dir.path().join("scratch.tmp").exists(), "cleanup still ran");
    Ok(())
}

#[tokio::test]
async fn test_stop_on_error_fails_the_profile_and_skips_the_rest() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_project(dir.path())?;

    let status = acsbuild::run(args(dir.path(), "strict")).await?;

    assert_eq!(status, RunStatus::Error);
    assert!(dir.path().join("scratch.tmp").exists(), "cleanup never ran");
    Ok(())
}

#[tokio::test]
async fn test_validation_errors_block_the_run_without_force() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_project(dir.path())?;

    let mut strict = args(dir.path(), "strict");
    strict.force = false;
    assert!(acsbuild::run(strict).await.is_err());
    assert!(dir.path().join("scratch.tmp").exists());

    let mut validate = args(dir.path(), "strict");
    validate.validate_only = true;
    assert_eq!(acsbuild::run(validate).await?, RunStatus::Error);

    let mut validate = args(dir.path(), "release");
    validate.validate_only = true;
    validate.force = false;
    assert_eq!(acsbuild::run(validate).await?, RunStatus::Success);
    Ok(())
}

#[tokio::test]
async fn test_unknown_profile_is_an_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_project(dir.path())?;

    let err = acsbuild::run(args(dir.path(), "nightly"))
        .await
        .expect_err("profile does not exist");
    assert!(err.to_string().contains("nightly"), "{err}");
    Ok(())
}
