// src/exec/task_runner.rs

//! Individual module process runner.

use anyhow::Context;
use std::process::ExitStatus;
use tracing::{info, warn};

use crate::errors::Result;
use crate::exec::launch::{LaunchPlan, LaunchSettings};
use crate::types::ModuleId;

/// What happened to one module.
#[derive(Debug)]
pub enum ModuleOutcome {
    /// The identifier did not resolve to an existing file; nothing spawned.
    NotFound,
    /// The process ran and exited. The status is reported, not judged.
    Exited(ExitStatus),
}

/// Validate, launch and await one module.
///
/// Completion is gated on the process *exiting*, not just starting.
pub async fn run_module(module: &ModuleId, settings: &LaunchSettings) -> Result<ModuleOutcome> {
    if !module.exists().await {
        warn!(
            module = %module,
            "test module not found; build the test application first or run without --no-build"
        );
        return Ok(ModuleOutcome::NotFound);
    }

    let plan = LaunchPlan::for_module(module, settings);
    info!(
        module = %module,
        program = %plan.program().display(),
        library = matches!(plan, LaunchPlan::Library { .. }),
        "starting test module"
    );

    let mut child = plan
        .command()
        .spawn()
        .with_context(|| format!("spawning process for module '{module}'"))?;

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of module '{module}'"))?;

    info!(
        module = %module,
        exit_code = status.code().unwrap_or(-1),
        success = status.success(),
        "test module exited"
    );

    Ok(ModuleOutcome::Exited(status))
}
