// src/lib.rs

pub mod build;
pub mod channel;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use tokio::process::Command as ProcessCommand;
use tracing::{debug, info, warn};

use crate::build::CommandBuildTrigger;
use crate::channel::ChannelAddress;
use crate::cli::{CliArgs, Command, ExecArgs, NotifyArgs, RunArgs};
use crate::config::load_or_default;
use crate::engine::{Coordinator, DiscoverySettings};
use crate::errors::Result;
use crate::exec::{LaunchSettings, ModuleRunner, ProcessRunner};
use crate::types::TriggerMode;

/// High-level entry point used by `main.rs`. Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    match args.into_command() {
        Command::Run(run_args) => run_tests(run_args).await,
        Command::Notify(notify_args) => notify(notify_args).await,
        Command::Exec(exec_args) => exec_library(exec_args).await,
    }
}

/// Build, discover and run every test module the build reports.
///
/// This wires together:
/// - config loading
/// - the discovery channel (fresh address per run)
/// - the process runner for discovered modules
/// - the build trigger
/// - the coordinator
///
/// Per-module outcomes never change the exit code.
pub async fn run_tests(args: RunArgs) -> Result<i32> {
    let cfg = load_or_default(args.config.as_deref())?;

    let address = ChannelAddress::generate();
    let listener = channel::bind(&address, &cfg.channel)?;

    let settings = LaunchSettings::from_config(&cfg.exec, args.config.as_deref())?;
    debug!(host = %settings.host.display(), "library host resolved");
    let runner: Arc<dyn ModuleRunner> = Arc::new(ProcessRunner::new(settings));

    let trigger = CommandBuildTrigger::new(&cfg.build, args.build_args);
    let mode = TriggerMode::from_no_build(args.no_build);

    let coordinator = Coordinator::new(
        address,
        listener,
        trigger,
        runner,
        DiscoverySettings::from_config(&cfg.channel),
    );

    // Ctrl-C → stop discovery and drop the listener before exiting.
    {
        let shutdown = coordinator.shutdown_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            shutdown.cancel();
        });
    }

    let summary = coordinator.run(mode).await?;

    debug!(?summary, "run complete");
    Ok(0)
}

async fn notify(args: NotifyArgs) -> Result<i32> {
    let address = ChannelAddress::from_token(args.channel);
    channel::notify(&address, &args.module).await?;
    debug!(channel = %address, module = %args.module, "module reported");
    Ok(0)
}

async fn exec_library(args: ExecArgs) -> Result<i32> {
    let cfg = load_or_default(args.config.as_deref())?;
    info!(
        runner = %cfg.exec.library_runner,
        library = %args.library.display(),
        "executing test library"
    );

    let status = ProcessCommand::new(&cfg.exec.library_runner)
        .arg(&cfg.exec.library_arg)
        .arg(&args.library)
        .status()
        .await
        .with_context(|| format!("running library runner '{}'", cfg.exec.library_runner))?;

    Ok(status.code().unwrap_or(1))
}
