// src/engine/coordinator.rs

//! Lifecycle coordinator.
//!
//! A run goes through these steps:
//! 1. start the acceptor in the background
//! 2. run the build (blocking from the coordinator's point of view)
//! 3. join the discovery registry, then the executor registry
//! 4. cancel the acceptor and wait for it
//! 5. join both registries again, covering connections the acceptor
//!    drained while stopping
//!
//! If the acceptor fails while the build is still running, the build is
//! abandoned and the acceptor's error is returned.
//!
//! Cancelling [`Coordinator::shutdown_token`] (Ctrl-C) abandons the build
//! and any outstanding waits, stops the acceptor so the listener is dropped,
//! and returns [`RelayError::Interrupted`].

use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::build::BuildTrigger;
use crate::channel::{ChannelAddress, ChannelListener};
use crate::engine::acceptor::Acceptor;
use crate::engine::registry::Registries;
use crate::engine::DiscoverySettings;
use crate::errors::{RelayError, Result};
use crate::exec::ModuleRunner;
use crate::types::TriggerMode;

/// Counts observed by the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Discovery tasks spawned (one per accepted connection).
    pub discovered: usize,
    /// Executor tasks spawned (one per drained connection).
    pub executed: usize,
    /// The build's own exit code; informational.
    pub build_exit_code: i32,
}

pub struct Coordinator<T: BuildTrigger> {
    address: ChannelAddress,
    listener: Box<dyn ChannelListener>,
    trigger: T,
    runner: Arc<dyn ModuleRunner>,
    settings: DiscoverySettings,
    shutdown: CancellationToken,
}

impl<T: BuildTrigger> std::fmt::Debug for Coordinator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("address", &self.address)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<T: BuildTrigger> Coordinator<T> {
    pub fn new(
        address: ChannelAddress,
        listener: Box<dyn ChannelListener>,
        trigger: T,
        runner: Arc<dyn ModuleRunner>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            address,
            listener,
            trigger,
            runner,
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that interrupts [`Coordinator::run`] when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run(self, mode: TriggerMode) -> Result<RunSummary> {
        let Coordinator {
            address,
            listener,
            mut trigger,
            runner,
            settings,
            shutdown,
        } = self;

        let registries = Registries::new();
        let cancel = CancellationToken::new();

        let acceptor = Acceptor::new(listener, registries.clone(), runner, settings);
        let mut acceptor_handle = tokio::spawn(acceptor.run(cancel.clone()));

        info!(channel = %address, ?mode, "triggering build");

        let build = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                return interrupted(&cancel, acceptor_handle).await;
            }
            build = trigger.trigger(&address, mode) => build,
            joined = &mut acceptor_handle => {
                let err = match flatten(joined) {
                    Ok(()) => anyhow!("discovery acceptor stopped before the build finished"),
                    Err(err) => err,
                };
                return Err(RelayError::ChannelError(format!("{err:#}")));
            }
        };

        let build_exit_code = match build {
            Ok(code) => code,
            Err(err) => {
                cancel.cancel();
                if let Err(acceptor_err) = flatten(acceptor_handle.await) {
                    warn!(error = %format!("{acceptor_err:#}"), "acceptor failed during shutdown");
                }
                registries.join_all().await;
                return Err(err);
            }
        };

        debug!("build returned; waiting for discovered work");
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                return interrupted(&cancel, acceptor_handle).await;
            }
            _ = registries.join_all() => {}
        }

        cancel.cancel();
        flatten(acceptor_handle.await).map_err(|e| RelayError::ChannelError(format!("{e:#}")))?;

        // Listener is already gone here.
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                warn!("interrupted while waiting for test modules");
                return Err(RelayError::Interrupted);
            }
            _ = registries.join_all() => {}
        }

        let summary = RunSummary {
            discovered: registries.discovery.spawned(),
            executed: registries.executor.spawned(),
            build_exit_code,
        };

        let faults = registries.faults();
        if !faults.is_empty() {
            return Err(RelayError::Other(anyhow!(
                "{} task(s) faulted: {}",
                faults.len(),
                faults.join("; ")
            )));
        }

        info!(
            discovered = summary.discovered,
            executed = summary.executed,
            "all discovered test modules finished"
        );
        Ok(summary)
    }
}

async fn interrupted<R>(
    cancel: &CancellationToken,
    acceptor: JoinHandle<anyhow::Result<()>>,
) -> Result<R> {
    warn!("interrupted; stopping discovery");
    cancel.cancel();
    if let Err(err) = flatten(acceptor.await) {
        warn!(error = %format!("{err:#}"), "acceptor failed during shutdown");
    }
    Err(RelayError::Interrupted)
}

fn flatten(joined: std::result::Result<anyhow::Result<()>, JoinError>) -> anyhow::Result<()> {
    match joined {
        Ok(res) => res,
        Err(join_err) => Err(anyhow!("acceptor task failed: {join_err}")),
    }
}
