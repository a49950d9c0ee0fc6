mod common;
use crate::common::TestResult;

use std::path::Path;

use acsbuild::classify::acc;
use acsbuild::fs::{FileSystem, MockFileSystem};
use acsbuild::result::{ProcessInvocationResult, ResultType};

#[test]
fn test_classify_clean_exit_is_success() {
    let result = acc::classify(&ProcessInvocationResult::exited(Some(0)), None);

    assert_eq!(result.result_type(), ResultType::Success);
    assert_eq!(result.message, "ACC compiled successfully");
}

#[test]
fn test_classify_uses_error_file_text() {
    let result = acc::classify(
        &ProcessInvocationResult::exited(Some(1)),
        Some("line 3: undefined symbol\n"),
    );

    assert_eq!(result.result_type(), ResultType::Error);
    assert_eq!(result.message, "line 3: undefined symbol");
    assert_eq!(result.errors, vec!["line 3: undefined symbol".to_string()]);
}

#[test]
fn test_classify_without_error_file_is_unknown_failure() {
    for text in [None, Some(""), Some("  \n")] {
        let result = acc::classify(&ProcessInvocationResult::exited(Some(2)), text);
        assert_eq!(result.result_type(), ResultType::Error);
        assert_eq!(result.message, "ACC failed for an unknown reason");
    }
}

#[test]
fn test_classify_missing_exit_code_is_failure() {
    let result = acc::classify(&ProcessInvocationResult::exited(None), None);
    assert_eq!(result.result_type(), ResultType::Error);
}

#[test]
fn test_classify_launch_failure_keeps_exception() {
    let launch = ProcessInvocationResult::failed(anyhow::anyhow!("no such file"));
    let result = acc::classify(&launch, Some("ignored"));

    assert_eq!(result.result_type(), ResultType::Error);
    assert!(result.exception.is_some());
    assert!(result.message.contains("no such file"), "{}", result.message);
}

#[test]
fn test_error_file_lives_next_to_the_input() {
    assert_eq!(
        acc::error_file_path(Path::new("/p/src/main.acs")),
        Path::new("/p/src/acs.err")
    );
}

#[test]
fn test_backup_moves_stale_file_and_avoids_collisions() -> TestResult {
    let fs = MockFileSystem::new();
    let err_file = Path::new("/p/src/acs.err");

    assert_eq!(acc::backup_error_file(&fs, err_file)?, None);

    fs.add_file(err_file, "stale one");
    let first = acc::backup_error_file(&fs, err_file)?.expect("first backup");
    assert!(!fs.exists(err_file));
    assert_eq!(fs.read_to_string(&first)?, "stale one");

    fs.add_file(err_file, "stale two");
    let second = acc::backup_error_file(&fs, err_file)?.expect("second backup");
    assert_ne!(first, second);
    assert_eq!(fs.read_to_string(&second)?, "stale two");

    for backup in [&first, &second] {
        let name = backup.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("acs.") && name.ends_with(".err"), "{name}");
        assert_eq!(backup.parent(), Some(Path::new("/p/src")));
    }
    Ok(())
}

#[test]
fn test_collect_reads_and_deletes_unless_kept() {
    let fs = MockFileSystem::new();
    let err_file = Path::new("/p/acs.err");

    assert_eq!(acc::collect_error_file(&fs, err_file, false), None);

    fs.add_file(err_file, "boom");
    assert_eq!(acc::collect_error_file(&fs, err_file, true).as_deref(), Some("boom"));
    assert!(fs.exists(err_file));

    assert_eq!(acc::collect_error_file(&fs, err_file, false).as_deref(), Some("boom"));
    assert!(!fs.exists(err_file));
}

#[cfg(unix)]
mod with_fake_compiler {
    use super::*;

    use std::path::PathBuf;
    use std::sync::Arc;

    use acsbuild::context::keys;
    use acsbuild::result::OutputLineKind;
    use acsbuild::task::{AccCompileTask, TaskDefinition, TaskKind};
    use acsbuild_test_utils::builders::ContextBuilder;
    use acsbuild_test_utils::init_tracing;
    use acsbuild_test_utils::scripts::write_script;

    use crate::common::run_builtin;

    /// Fake ACC: `$1` is the input, `$2` the object file.
    const WRITES_ERROR_FILE: &str = r#"
printf 'line 3: undefined symbol\n' > "$(dirname "$1")/acs.err"
exit 1"#;

    const SUCCEEDS: &str = r#"
echo "ACC 1.57 compiling $1"
printf 'object' > "$2"
exit 0"#;

    fn compile_task(keep_error_file: bool) -> Arc<TaskDefinition> {
        Arc::new(TaskDefinition::new(
            "compile",
            TaskKind::AccCompile(AccCompileTask {
                input: PathBuf::from("src/main.acs"),
                output: PathBuf::from("acs/main.o"),
                include_dirs: vec![],
                extra_args: vec![],
                keep_error_file,
            }),
        ))
    }

    fn project(body: &str) -> std::io::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("src"))?;
        std::fs::write(dir.path().join("src/main.acs"), "#include \"zcommon.acs\"\n")?;
        write_script(dir.path(), "acc", body);
        Ok(dir)
    }

    #[tokio::test]
    async fn test_error_file_becomes_the_error_message() -> TestResult {
        init_tracing();
        let dir = project(WRITES_ERROR_FILE)?;
        let mut ctx = ContextBuilder::new()
            .project_dir(dir.path())
            .tool(keys::ACC_COMPILER, dir.path().join("acc"))
            .build();

        let (result, output) = run_builtin(&compile_task(false), &mut ctx).await?;

        assert_eq!(result.result_type(), ResultType::Error);
        assert_eq!(result.message, "line 3: undefined symbol");
        assert!(!dir.path().join("src/acs.err").exists());

        let last = output.lines().last().expect("outcome line");
        assert_eq!(last.kind, OutputLineKind::Error);
        Ok(())
    }

    #[tokio::test]
    async fn test_keep_error_file_leaves_it_in_place() -> TestResult {
        let dir = project(WRITES_ERROR_FILE)?;
        let mut ctx = ContextBuilder::new()
            .project_dir(dir.path())
            .tool(keys::ACC_COMPILER, dir.path().join("acc"))
            .build();

        let (result, _) = run_builtin(&compile_task(true), &mut ctx).await?;

        assert_eq!(result.result_type(), ResultType::Error);
        assert!(dir.path().join("src/acs.err").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_error_file_is_backed_up_not_reported() -> TestResult {
        let dir = project(WRITES_ERROR_FILE)?;
        std::fs::write(dir.path().join("src/acs.err"), "stale error from last week")?;
        let mut ctx = ContextBuilder::new()
            .project_dir(dir.path())
            .tool(keys::ACC_COMPILER, dir.path().join("acc"))
            .build();

        let (result, _) = run_builtin(&compile_task(false), &mut ctx).await?;

        assert_eq!(result.message, "line 3: undefined symbol");

        let backups: Vec<PathBuf> = std::fs::read_dir(dir.path().join("src"))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                let name = p.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                name.starts_with("acs.") && name.ends_with(".err") && name != "acs.err"
            })
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read_to_string(&backups[0])?, "stale error from last week");
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_without_error_file_is_unknown() -> TestResult {
        let dir = project("exit 1")?;
        let mut ctx = ContextBuilder::new()
            .project_dir(dir.path())
            .tool(keys::ACC_COMPILER, dir.path().join("acc"))
            .build();

        let (result, _) = run_builtin(&compile_task(false), &mut ctx).await?;

        assert_eq!(result.result_type(), ResultType::Error);
        assert_eq!(result.message, "ACC failed for an unknown reason");
        Ok(())
    }

    #[tokio::test]
    async fn test_success_creates_output_dir_and_echoes_stdout() -> TestResult {
        let dir = project(SUCCEEDS)?;
        let mut ctx = ContextBuilder::new()
            .project_dir(dir.path())
            .tool(keys::ACC_COMPILER, dir.path().join("acc"))
            .build();

        let (result, output) = run_builtin(&compile_task(false), &mut ctx).await?;

        assert_eq!(result.result_type(), ResultType::Success);
        assert_eq!(result.message, "ACC compiled successfully");
        assert_eq!(std::fs::read_to_string(dir.path().join("acs/main.o"))?, "object");

        let texts: Vec<&str> = output.lines().iter().map(|l| l.text.as_str()).collect();
        assert!(texts.iter().any(|t| t.starts_with("ACC 1.57 compiling")), "{texts:?}");
        assert_eq!(output.lines().last().map(|l| l.kind), Some(OutputLineKind::Success));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_tool_path_fails_the_context_check() -> TestResult {
        let dir = project(SUCCEEDS)?;
        let mut ctx = ContextBuilder::new().project_dir(dir.path()).build();

        let err = run_builtin(&compile_task(false), &mut ctx)
            .await
            .expect_err("no ACC path configured");
        assert!(err.to_string().contains(keys::ACC_COMPILER), "{err}");
        Ok(())
    }
}
