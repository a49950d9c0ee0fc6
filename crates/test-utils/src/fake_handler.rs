use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use acsbuild::context::InvocationContext;
use acsbuild::errors::Result;
use acsbuild::task::{
    DeleteFileTask, HandlerFuture, HandlerKind, HandlerRegistry, OutputLog, TaskDefinition,
    TaskHandler, TaskKind,
};
use acsbuild::result::TaskInvocationResult;
use tokio_util::sync::CancellationToken;

/// Handler kind the fakes are registered under.
pub const FAKE_KIND: HandlerKind = HandlerKind::DeleteFile;

/// What a scripted task does when it runs.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Succeed,
    SucceedWithWarnings(Vec<String>),
    Fail(String),
    /// Block until the cancellation token fires, then report cancellation.
    WaitForCancel,
    /// Redirect the context's working directory, then succeed.
    SetWorkingDirectory(PathBuf),
}

/// Task definition that resolves to a fake handler.
pub fn fake_task(name: &str) -> Arc<TaskDefinition> {
    Arc::new(TaskDefinition::new(
        name,
        TaskKind::DeleteFile(DeleteFileTask {
            path: PathBuf::from(name),
        }),
    ))
}

/// Scripted handlers that record what ran, in which order, and which
/// working directory each saw.
///
/// Tasks without a script entry succeed.
#[derive(Clone, Default)]
pub struct FakeHandlers {
    script: Arc<Mutex<BTreeMap<String, FakeOutcome>>>,
    required_keys: Arc<Mutex<BTreeMap<String, String>>>,
    executed: Arc<Mutex<Vec<String>>>,
    seen_dirs: Arc<Mutex<Vec<Option<PathBuf>>>>,
}

impl FakeHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, task: &str, outcome: FakeOutcome) -> &Self {
        self.script
            .lock()
            .unwrap()
            .insert(task.to_string(), outcome);
        self
    }

    /// Make `task`'s context check require `key` in the context bag.
    pub fn require_key(&self, task: &str, key: &str) -> &Self {
        self.required_keys
            .lock()
            .unwrap()
            .insert(task.to_string(), key.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn seen_working_dirs(&self) -> Vec<Option<PathBuf>> {
        self.seen_dirs.lock().unwrap().clone()
    }

    /// Registry with only the fakes registered.
    pub fn registry(&self) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        self.register_into(&mut registry);
        registry
    }

    pub fn register_into(&self, registry: &mut HandlerRegistry) {
        let fakes = self.clone();
        registry.register(FAKE_KIND, move |task: &Arc<TaskDefinition>| {
            let outcome = fakes
                .script
                .lock()
                .unwrap()
                .get(&task.name)
                .cloned()
                .unwrap_or(FakeOutcome::Succeed);
            let required_key = fakes.required_keys.lock().unwrap().get(&task.name).cloned();
            Some(Box::new(FakeHandler {
                name: task.name.clone(),
                outcome,
                required_key,
                executed: Arc::clone(&fakes.executed),
                seen_dirs: Arc::clone(&fakes.seen_dirs),
            }) as Box<dyn TaskHandler>)
        });
    }
}

struct FakeHandler {
    name: String,
    outcome: FakeOutcome,
    required_key: Option<String>,
    executed: Arc<Mutex<Vec<String>>>,
    seen_dirs: Arc<Mutex<Vec<Option<PathBuf>>>>,
}

impl TaskHandler for FakeHandler {
    fn check_context(&self, ctx: &InvocationContext) -> Result<()> {
        match &self.required_key {
            Some(key) => ctx.bag().get_path(key).map(|_| ()),
            None => Ok(()),
        }
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut InvocationContext,
        output: &'a mut OutputLog,
        cancel: &'a CancellationToken,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(self.name.clone());
            self.seen_dirs
                .lock()
                .unwrap()
                .push(ctx.working_directory().map(|d| d.to_path_buf()));
            output.message(format!("running {}", self.name));

            match &self.outcome {
                FakeOutcome::Succeed => TaskInvocationResult::success(format!("{} ok", self.name)),
                FakeOutcome::SucceedWithWarnings(warnings) => {
                    TaskInvocationResult::success(format!("{} ok", self.name))
                        .with_warnings(warnings.clone())
                }
                FakeOutcome::Fail(message) => TaskInvocationResult::failure(message.clone()),
                FakeOutcome::WaitForCancel => {
                    cancel.cancelled().await;
                    TaskInvocationResult::cancelled()
                }
                FakeOutcome::SetWorkingDirectory(dir) => {
                    ctx.set_working_directory(dir.clone());
                    TaskInvocationResult::success(format!("{} moved working directory", self.name))
                }
            }
        })
    }
}
