// src/exec/backend.rs

//! Pluggable module runner abstraction.
//!
//! Discovery tasks hand each module to a `ModuleRunner` instead of spawning
//! processes directly, so tests can swap in a fake that records modules.

use std::future::Future;
use std::pin::Pin;

use tracing::error;

use crate::exec::launch::LaunchSettings;
use crate::exec::task_runner::run_module;
use crate::types::ModuleId;

/// Trait abstracting how a discovered module is run.
///
/// The returned future completes when the run is over. An `Err` is recorded
/// by the executor registry as a task fault.
pub trait ModuleRunner: Send + Sync {
    fn run(&self, module: ModuleId) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;
}

/// Production runner: real processes via [`run_module`].
///
/// Per-module failures (missing file, spawn or wait errors) stay inside the
/// module's task and never fail the run.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    settings: LaunchSettings,
}

impl ProcessRunner {
    pub fn new(settings: LaunchSettings) -> Self {
        Self { settings }
    }
}

impl ModuleRunner for ProcessRunner {
    fn run(&self, module: ModuleId) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            if let Err(err) = run_module(&module, &self.settings).await {
                error!(module = %module, error = %err, "test module execution error");
            }
            Ok(())
        })
    }
}
