mod common;
use crate::common::TestResult;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use acsbuild::config::{load_and_validate, parse_and_validate, parse_raw};
use acsbuild::context::{keys, ContextBag, ContextValue};
use acsbuild::errors::AcsBuildError;
use acsbuild::task::{HandlerKind, Runnable, TaskKind};
use acsbuild::types::ErrorBehavior;

const PROJECT: &str = r#"
[settings]
working_directory = "build"
temp_directory = ".acsbuild/tmp"

[tools]
acc = "tools/acc/acc"
bcc = "bcc"
gdcc_ld = "/opt/gdcc/gdcc-ld"

[task.compile]
kind = "acc_compile"
input = "src/main.acs"
output = "acs/main.o"
include_dirs = ["src/include"]

[task.copy]
kind = "copy_project"
target = "/tmp/mod-build"
exclude = [".git/**", "*.bak"]

[task.pack]
kind = "zip_folder"
folder = "."
output = "dist/mod.pk3"

[task.clean]
kind = "delete_file"
path = "acs/main.o"

[profile.release]
tasks = ["copy", "compile", { task = "pack", error_behavior = "dont_stop" }]

[profile.quick]
tasks = [{ task = "compile" }, "clean"]
"#;

#[test]
fn test_parses_tasks_and_profiles() -> TestResult {
    let project = parse_and_validate(PROJECT, "/home/me/mod")?;

    let names: Vec<&str> = project.tasks().map(|t| t.name()).collect();
    assert_eq!(names, vec!["clean", "compile", "copy", "pack"]);

    let compile = project.task("compile").expect("compile task");
    assert_eq!(compile.handler_kind(), HandlerKind::AccCompile);
    match &compile.kind {
        TaskKind::AccCompile(params) => {
            assert_eq!(params.input, PathBuf::from("src/main.acs"));
            assert_eq!(params.include_dirs, vec![PathBuf::from("src/include")]);
            assert!(!params.keep_error_file);
        }
        other => panic!("unexpected kind {other:?}"),
    }

    match &project.task("copy").expect("copy task").kind {
        TaskKind::CopyProject(params) => assert!(params.set_working_directory),
        other => panic!("unexpected kind {other:?}"),
    }

    let profiles: Vec<&str> = project.profile_names().collect();
    assert_eq!(profiles, vec!["quick", "release"]);
    Ok(())
}

#[test]
fn test_profile_entries_keep_order_and_error_behavior() -> TestResult {
    let project = parse_and_validate(PROJECT, "/home/me/mod")?;

    let release = project.profile("release")?;
    let entries: Vec<(&str, ErrorBehavior)> = release
        .entries
        .iter()
        .map(|e| (e.task.name(), e.error_behavior))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("copy", ErrorBehavior::StopOnError),
            ("compile", ErrorBehavior::StopOnError),
            ("pack", ErrorBehavior::DontStop),
        ]
    );

    let quick = project.profile("quick")?;
    assert_eq!(quick.entries[0].error_behavior, ErrorBehavior::StopOnError);

    // Both profiles share one definition of `compile`.
    assert!(Arc::ptr_eq(&release.entries[1].task, &quick.entries[0].task));
    Ok(())
}

#[test]
fn test_unknown_profile_is_reported() -> TestResult {
    let project = parse_and_validate(PROJECT, "/home/me/mod")?;
    let err = project.profile("debug").expect_err("no such profile");
    assert!(matches!(err, AcsBuildError::ProfileNotFound(ref name) if name == "debug"));
    Ok(())
}

#[test]
fn test_directories_resolve_against_the_root() -> TestResult {
    let project = parse_and_validate(PROJECT, "/home/me/mod")?;

    assert_eq!(project.project_directory(), Path::new("/home/me/mod"));
    assert_eq!(project.working_directory(), Path::new("/home/me/mod/build"));

    let ctx = project.invocation_context();
    assert_eq!(ctx.project_directory(), Some(Path::new("/home/me/mod")));
    assert_eq!(ctx.working_directory(), Some(Path::new("/home/me/mod/build")));
    Ok(())
}

#[test]
fn test_context_bag_holds_tool_paths() -> TestResult {
    let project = parse_and_validate(PROJECT, "/home/me/mod")?;
    let bag = project.context_bag();

    assert_eq!(
        bag.get_path(keys::ACC_COMPILER)?,
        Path::new("/home/me/mod/tools/acc/acc")
    );
    // Bare names are left for PATH lookup.
    assert_eq!(bag.get_path(keys::BCC_COMPILER)?, Path::new("bcc"));
    assert_eq!(bag.get_path(keys::GDCC_LINKER)?, Path::new("/opt/gdcc/gdcc-ld"));
    assert_eq!(
        bag.get_path(keys::TEMP_DIRECTORY)?,
        Path::new("/home/me/mod/.acsbuild/tmp")
    );

    assert!(!bag.contains_key(keys::ACS_VM));
    assert!(matches!(
        bag.get_path(keys::ACS_VM),
        Err(AcsBuildError::MissingContextKey(_))
    ));
    Ok(())
}

#[test]
fn test_profile_referencing_unknown_task_is_rejected() {
    let toml = r#"
[task.a]
kind = "delete_file"
path = "x"

[profile.p]
tasks = ["a", "ghost"]
"#;
    let err = parse_and_validate(toml, ".").expect_err("unknown task");
    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("ghost"), "{err}");
}

#[test]
fn test_empty_profile_is_rejected() {
    let toml = r#"
[task.a]
kind = "delete_file"
path = "x"

[profile.p]
tasks = []
"#;
    let err = parse_and_validate(toml, ".").expect_err("empty profile");
    assert!(err.to_string().contains("has no tasks"), "{err}");
}

#[test]
fn test_project_without_tasks_is_rejected() {
    let err = parse_and_validate("[settings]\n", ".").expect_err("no tasks");
    assert!(matches!(err, AcsBuildError::ConfigError(_)));
}

#[test]
fn test_unknown_task_kind_is_a_parse_error() {
    let toml = r#"
[task.a]
kind = "compile_everything"
"#;
    let err = parse_raw(toml).expect_err("unknown kind");
    assert!(matches!(err, AcsBuildError::TomlError(_)));
}

#[test]
fn test_invalid_error_behavior_is_a_parse_error() {
    let toml = r#"
[task.a]
kind = "delete_file"
path = "x"

[profile.p]
tasks = [{ task = "a", error_behavior = "sometimes" }]
"#;
    assert!(parse_raw(toml).is_err());
}

#[test]
fn test_every_task_kind_parses() -> TestResult {
    let toml = r#"
[task.acc]
kind = "acc_compile"
input = "a.acs"
output = "a.o"
keep_error_file = true

[task.bcc]
kind = "bcc_compile"
input = "a.bcs"
output = "b.o"

[task.gacc]
kind = "gdcc_acc_compile"
input = "a.acs"
output = "a.ir"
target = "ZDoom"

[task.gcc]
kind = "gdcc_cc_compile"
input = "a.c"
output = "c.ir"

[task.link]
kind = "gdcc_link"
inputs = ["a.ir", "c.ir"]
output = "out.o"

[task.lib]
kind = "gdcc_make_lib"
output = "lib.ir"
libraries = ["libc"]

[task.build]
kind = "gdcc_build"
sources = ["a.c", "b.c"]
output = "out.o"
object_dir = "obj"

[task.vm]
kind = "run_in_vm"
input = "out.o"

[task.cp]
kind = "copy_file"
source = "a"
target = "b"
overwrite = true

[task.mv]
kind = "move_file"
source = "a"
target = "b"

[task.rm]
kind = "delete_file"
path = "b"

[task.copy]
kind = "copy_project"
target = "/tmp/x"
set_working_directory = false

[task.zip]
kind = "zip_folder"
folder = "out"
output = "mod.pk3"
"#;
    let project = parse_and_validate(toml, ".")?;

    let mut kinds: Vec<HandlerKind> = project.tasks().map(|t| t.handler_kind()).collect();
    kinds.sort_by_key(|k| k.as_str());
    let mut expected = HandlerKind::ALL.to_vec();
    expected.sort_by_key(|k| k.as_str());
    assert_eq!(kinds, expected);
    Ok(())
}

#[test]
fn test_load_from_disk_roots_at_the_file_directory() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("acsbuild.toml");
    std::fs::write(&path, PROJECT)?;

    let project = load_and_validate(&path)?;
    assert_eq!(project.root(), dir.path());
    assert_eq!(project.working_directory(), dir.path().join("build"));
    Ok(())
}

#[test]
fn test_missing_project_file_is_an_io_error() {
    let err = load_and_validate("/definitely/not/here/acsbuild.toml").expect_err("missing file");
    assert!(matches!(err, AcsBuildError::IoError(_)));
}

#[test]
fn test_context_bag_accepts_text_paths_and_rejects_flags() {
    let mut bag = ContextBag::new().with_flag(keys::TEMP_DIRECTORY, false);
    bag.insert(keys::BCC_COMPILER, ContextValue::Text("tools/bcc".to_string()));

    assert_eq!(bag.get_path(keys::BCC_COMPILER).ok(), Some(Path::new("tools/bcc")));
    assert!(matches!(
        bag.get_optional_path(keys::TEMP_DIRECTORY),
        Err(AcsBuildError::WrongContextType { expected: "path", found: "flag", .. })
    ));
    assert!(matches!(bag.get_optional_path(keys::ACS_VM), Ok(None)));
}
