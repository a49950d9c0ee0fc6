// src/task/registry.rs

//! Handler provider: maps a [`HandlerKind`] to a factory building the
//! handler for one task invocation.
//!
//! Factories receive the whole [`TaskDefinition`] and pick out the variant
//! they understand. A factory that gets a task of the wrong kind returns
//! `None`, which the registry reports as a mismatch; handlers themselves
//! only ever see their own concrete parameter type.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{AcsBuildError, Result};
use crate::task::handlers;
use crate::task::{HandlerKind, Runnable, TaskDefinition, TaskHandler};

pub type HandlerFactory =
    Arc<dyn Fn(&Arc<TaskDefinition>) -> Option<Box<dyn TaskHandler>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: BTreeMap<HandlerKind, HandlerFactory>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HandlerRegistry {
    /// An empty registry. Every lookup fails until handlers are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a handler for every built-in task kind.
    pub fn with_builtin_handlers() -> Self {
        let mut registry = Self::new();
        handlers::register_builtin(&mut registry);
        registry
    }

    /// Register (or replace) the factory for `kind`.
    pub fn register<F>(&mut self, kind: HandlerKind, factory: F) -> &mut Self
    where
        F: Fn(&Arc<TaskDefinition>) -> Option<Box<dyn TaskHandler>> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Arc::new(factory));
        self
    }

    pub fn contains(&self, kind: HandlerKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Build the handler for `task`.
    pub fn resolve(&self, task: &Arc<TaskDefinition>) -> Result<Box<dyn TaskHandler>> {
        let kind = task.handler_kind();
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| AcsBuildError::UnknownHandler {
                kind,
                task: task.name().to_string(),
            })?;

        debug!(task = %task.name(), %kind, "resolved task handler");

        factory(task).ok_or_else(|| AcsBuildError::HandlerMismatch {
            kind,
            task: task.name().to_string(),
        })
    }
}
