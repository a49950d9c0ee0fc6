mod common;
use crate::common::{init_tracing, with_timeout, TestResult};

use std::path::PathBuf;

use acsbuild::context::keys;
use acsbuild::engine::{Orchestrator, ProfileRun, RunEvent};
use acsbuild::errors::AcsBuildError;
use acsbuild::task::{HandlerKind, HandlerRegistry};
use acsbuild::types::{ErrorBehavior, RunStatus};
use acsbuild_test_utils::builders::{ContextBuilder, ProfileBuilder};
use acsbuild_test_utils::fake_handler::{fake_task, FakeHandlers, FakeOutcome};
use tokio::sync::mpsc;

#[tokio::test]
async fn test_stop_on_error_leaves_later_tasks_pending() -> TestResult {
    init_tracing();

    let fakes = FakeHandlers::new();
    fakes.script("compile_b", FakeOutcome::Fail("boom".to_string()));

    let profile = ProfileBuilder::new("release")
        .stop("compile_a")
        .stop("compile_b")
        .stop("copy")
        .build();

    let orchestrator = Orchestrator::new(fakes.registry());
    let mut ctx = ContextBuilder::new().project_dir("/project").build();

    let run = with_timeout(orchestrator.run_profile(&profile, &mut ctx)).await?;

    assert_eq!(run.status, RunStatus::Error);
    assert_eq!(
        run.statuses(),
        vec![RunStatus::Success, RunStatus::Error, RunStatus::Pending]
    );
    assert_eq!(fakes.executed(), vec!["compile_a", "compile_b"]);

    let failed = run.task("compile_b").expect("task exists");
    assert_eq!(failed.result_message.as_deref(), Some("boom"));
    assert_eq!(failed.errors.as_deref(), Some(&["boom".to_string()][..]));

    let skipped = run.task("copy").expect("task exists");
    assert!(skipped.result_message.is_none());
    assert!(skipped.output.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_dont_stop_failures_keep_profile_successful() -> TestResult {
    init_tracing();

    let fakes = FakeHandlers::new();
    fakes.script("compile", FakeOutcome::Fail("undefined symbol".to_string()));

    let profile = ProfileBuilder::new("best_effort")
        .dont_stop("compile")
        .stop("zip")
        .build();

    let orchestrator = Orchestrator::new(fakes.registry());
    let mut ctx = ContextBuilder::new().project_dir("/project").build();

    let run = with_timeout(orchestrator.run_profile(&profile, &mut ctx)).await?;

    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.statuses(), vec![RunStatus::Error, RunStatus::Success]);
    assert_eq!(fakes.executed(), vec!["compile", "zip"]);

    let compile = run.task("compile").expect("task exists");
    assert_eq!(compile.result_message.as_deref(), Some("undefined symbol"));
    assert_eq!(run.failed_tasks().count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_success_result_keeps_warnings() -> TestResult {
    let fakes = FakeHandlers::new();
    fakes.script(
        "compile",
        FakeOutcome::SucceedWithWarnings(vec!["unused variable".to_string()]),
    );

    let profile = ProfileBuilder::new("p").stop("compile").build();
    let orchestrator = Orchestrator::new(fakes.registry());
    let mut ctx = ContextBuilder::new().build();

    let run = orchestrator.run_profile(&profile, &mut ctx).await?;

    let task = &run.tasks[0];
    assert_eq!(task.status, RunStatus::Success);
    assert_eq!(task.warnings.as_deref(), Some(&["unused variable".to_string()][..]));
    assert!(task.errors.is_none());
    assert!(task.exception.is_none());
    Ok(())
}

#[tokio::test]
async fn test_elapsed_time_is_recorded() -> TestResult {
    let fakes = FakeHandlers::new();
    let profile = ProfileBuilder::new("p").stop("a").stop("b").build();
    let orchestrator = Orchestrator::new(fakes.registry());
    let mut ctx = ContextBuilder::new().build();

    let mut run = ProfileRun::new(&profile);
    assert_eq!(run.status, RunStatus::Pending);
    assert!(run.elapsed_ms.is_none());

    orchestrator.invoke_profile(&mut run, &mut ctx).await?;

    assert_eq!(run.status, RunStatus::Success);
    assert!(run.elapsed_ms.is_some());
    Ok(())
}

#[tokio::test]
async fn test_unknown_handler_fails_before_any_task_runs() -> TestResult {
    init_tracing();

    let fakes = FakeHandlers::new();
    let zip = std::sync::Arc::new(acsbuild::task::TaskDefinition::new(
        "pack",
        acsbuild::task::TaskKind::ZipFolder(acsbuild::task::ZipFolderTask {
            folder: PathBuf::from("build"),
            output: PathBuf::from("out.pk3"),
            exclude: vec![],
        }),
    ));
    let profile = ProfileBuilder::new("p")
        .stop("first")
        .task(zip, ErrorBehavior::DontStop)
        .build();

    // Only the fake kind is registered; zip_folder has no handler.
    let orchestrator = Orchestrator::new(fakes.registry());
    let mut ctx = ContextBuilder::new().build();
    let mut run = ProfileRun::new(&profile);

    let err = orchestrator
        .invoke_profile(&mut run, &mut ctx)
        .await
        .expect_err("unknown handler must be an error");

    match err {
        AcsBuildError::UnknownHandler { kind, task } => {
            assert_eq!(kind, HandlerKind::ZipFolder);
            assert_eq!(task, "pack");
        }
        other => panic!("expected UnknownHandler, got {other:?}"),
    }
    assert!(fakes.executed().is_empty());
    assert_eq!(run.status, RunStatus::Error);
    assert_eq!(run.statuses(), vec![RunStatus::Pending, RunStatus::Pending]);
    Ok(())
}

#[tokio::test]
async fn test_missing_tool_path_is_a_configuration_error() -> TestResult {
    let fakes = FakeHandlers::new();
    fakes.require_key("compile", keys::ACC_COMPILER);

    let profile = ProfileBuilder::new("p").stop("prepare").stop("compile").build();
    let orchestrator = Orchestrator::new(fakes.registry());
    let mut ctx = ContextBuilder::new().build();

    let err = orchestrator
        .run_profile(&profile, &mut ctx)
        .await
        .expect_err("missing key must abort the run");

    assert!(err.is_configuration_error());
    assert!(matches!(err, AcsBuildError::MissingContextKey(ref key) if key == keys::ACC_COMPILER));
    assert!(fakes.executed().is_empty(), "nothing may run before the check");
    Ok(())
}

#[tokio::test]
async fn test_present_tool_path_passes_the_context_check() -> TestResult {
    let fakes = FakeHandlers::new();
    fakes.require_key("compile", keys::ACC_COMPILER);

    let profile = ProfileBuilder::new("p").stop("compile").build();
    let orchestrator = Orchestrator::new(fakes.registry());
    let mut ctx = ContextBuilder::new()
        .tool(keys::ACC_COMPILER, "/opt/acc/acc")
        .build();

    let run = orchestrator.run_profile(&profile, &mut ctx).await?;
    assert_eq!(run.status, RunStatus::Success);
    Ok(())
}

#[tokio::test]
async fn test_working_directory_change_is_seen_by_later_tasks() -> TestResult {
    let fakes = FakeHandlers::new();
    fakes.script(
        "copy_project",
        FakeOutcome::SetWorkingDirectory(PathBuf::from("/tmp/copy")),
    );

    let profile = ProfileBuilder::new("p")
        .stop("before")
        .stop("copy_project")
        .stop("after")
        .build();
    let orchestrator = Orchestrator::new(fakes.registry());
    let mut ctx = ContextBuilder::new().project_dir("/project").build();

    orchestrator.run_profile(&profile, &mut ctx).await?;

    assert_eq!(
        fakes.seen_working_dirs(),
        vec![
            Some(PathBuf::from("/project")),
            Some(PathBuf::from("/project")),
            Some(PathBuf::from("/tmp/copy")),
        ]
    );
    assert_eq!(ctx.working_directory(), Some(PathBuf::from("/tmp/copy").as_path()));
    assert_eq!(ctx.project_directory(), Some(PathBuf::from("/project").as_path()));
    Ok(())
}

#[tokio::test]
async fn test_events_follow_profile_order() -> TestResult {
    let fakes = FakeHandlers::new();
    fakes.script("b", FakeOutcome::Fail("nope".to_string()));

    let profile = ProfileBuilder::new("p").stop("a").stop("b").stop("c").build();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(fakes.registry()).with_events(tx);
    let mut ctx = ContextBuilder::new().build();

    orchestrator.run_profile(&profile, &mut ctx).await?;
    drop(orchestrator);

    let mut seen = Vec::new();
    while let Some(event) = rx.recv().await {
        let summary = match event {
            RunEvent::ProfileStarted { task_count, .. } => format!("start:{task_count}"),
            RunEvent::TaskStatusChanged { task, status, .. } => format!("{task}:{status}"),
            RunEvent::OutputLine { index, .. } => format!("line:{index}"),
            RunEvent::ProfileFinished { status, .. } => format!("finish:{status}"),
        };
        seen.push(summary);
    }

    assert_eq!(
        seen,
        vec![
            "start:3",
            "a:running",
            "line:0",
            "a:success",
            "b:running",
            "line:1",
            "b:error",
            "finish:error",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_output_log_is_kept_on_the_task_record() -> TestResult {
    let fakes = FakeHandlers::new();
    let profile = ProfileBuilder::new("p").stop("a").build();
    let orchestrator = Orchestrator::new(fakes.registry());
    let mut ctx = ContextBuilder::new().build();

    let run = orchestrator.run_profile(&profile, &mut ctx).await?;

    let lines = run.tasks[0].output.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text, "running a");
    Ok(())
}

#[tokio::test]
async fn test_same_definition_can_have_different_behavior_per_profile() -> TestResult {
    let fakes = FakeHandlers::new();
    fakes.script("flaky", FakeOutcome::Fail("flaky failed".to_string()));
    let flaky = fake_task("flaky");

    let strict = ProfileBuilder::new("strict")
        .task(flaky.clone(), ErrorBehavior::StopOnError)
        .stop("after")
        .build();
    let lenient = ProfileBuilder::new("lenient")
        .task(flaky, ErrorBehavior::DontStop)
        .stop("after")
        .build();

    let orchestrator = Orchestrator::new(fakes.registry());

    let mut ctx = ContextBuilder::new().build();
    let strict_run = orchestrator.run_profile(&strict, &mut ctx).await?;
    let mut ctx = ContextBuilder::new().build();
    let lenient_run = orchestrator.run_profile(&lenient, &mut ctx).await?;

    assert_eq!(strict_run.status, RunStatus::Error);
    assert_eq!(strict_run.tasks[1].status, RunStatus::Pending);
    assert_eq!(lenient_run.status, RunStatus::Success);
    assert_eq!(lenient_run.tasks[1].status, RunStatus::Success);
    Ok(())
}

#[tokio::test]
async fn test_empty_registry_rejects_every_task() -> TestResult {
    let profile = ProfileBuilder::new("p").stop("a").build();
    let orchestrator = Orchestrator::new(HandlerRegistry::new());
    let mut ctx = ContextBuilder::new().build();

    let result = orchestrator.run_profile(&profile, &mut ctx).await;
    assert!(matches!(result, Err(AcsBuildError::UnknownHandler { .. })));
    Ok(())
}

#[tokio::test]
async fn test_wrong_typed_tool_path_is_a_configuration_error() -> TestResult {
    let fakes = FakeHandlers::new();
    fakes.require_key("compile", keys::ACC_COMPILER);

    let profile = ProfileBuilder::new("p").stop("prepare").stop("compile").build();
    let orchestrator = Orchestrator::new(fakes.registry());
    let mut ctx = ContextBuilder::new().flag(keys::ACC_COMPILER, true).build();

    let mut run = ProfileRun::new(&profile);
    let err = orchestrator
        .invoke_profile(&mut run, &mut ctx)
        .await
        .expect_err("a flag is not a tool path");

    assert!(err.is_configuration_error());
    match err {
        AcsBuildError::WrongContextType { key, expected, found } => {
            assert_eq!(key, keys::ACC_COMPILER);
            assert_eq!(expected, "path");
            assert_eq!(found, "flag");
        }
        other => panic!("expected WrongContextType, got {other:?}"),
    }
    assert!(fakes.executed().is_empty());
    assert_eq!(run.status, RunStatus::Error);
    assert_eq!(run.statuses(), vec![RunStatus::Pending, RunStatus::Pending]);
    Ok(())
}

#[tokio::test]
async fn test_wrong_typed_capture_root_stops_compilers_before_launch() -> TestResult {
    use acsbuild::task::{AccCompileTask, TaskDefinition, TaskKind};
    use std::sync::Arc;

    let compile = Arc::new(TaskDefinition::new(
        "compile",
        TaskKind::AccCompile(AccCompileTask {
            input: PathBuf::from("src/main.acs"),
            output: PathBuf::from("acs/main.o"),
            include_dirs: vec![],
            extra_args: vec![],
            keep_error_file: false,
        }),
    ));
    let profile = ProfileBuilder::new("p")
        .task(compile, ErrorBehavior::StopOnError)
        .build();
    let orchestrator = Orchestrator::new(HandlerRegistry::with_builtin_handlers());
    let mut ctx = ContextBuilder::new()
        .project_dir("/project")
        .tool(keys::ACC_COMPILER, "/definitely/not/an/acc")
        .flag(keys::TEMP_DIRECTORY, true)
        .build();

    let mut run = ProfileRun::new(&profile);
    let err = orchestrator
        .invoke_profile(&mut run, &mut ctx)
        .await
        .expect_err("capture root must be a path");

    assert!(err.is_configuration_error());
    assert!(
        matches!(err, AcsBuildError::WrongContextType { ref key, .. } if key == keys::TEMP_DIRECTORY),
        "{err:?}"
    );
    assert_eq!(run.statuses(), vec![RunStatus::Pending]);
    assert!(run.tasks[0].output.is_empty(), "the compiler was never launched");
    Ok(())
}
