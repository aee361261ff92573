// src/engine/acceptor.rs

//! Connection acceptor: the accept loop feeding discovery tasks.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::channel::{ChannelListener, Endpoint};
use crate::engine::discovery::discover;
use crate::engine::registry::Registries;
use crate::engine::DiscoverySettings;
use crate::exec::ModuleRunner;

pub struct Acceptor {
    listener: Box<dyn ChannelListener>,
    registries: Registries,
    runner: Arc<dyn ModuleRunner>,
    settings: DiscoverySettings,
}

impl std::fmt::Debug for Acceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acceptor")
            .field("registries", &self.registries)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Acceptor {
    pub fn new(
        listener: Box<dyn ChannelListener>,
        registries: Registries,
        runner: Arc<dyn ModuleRunner>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            listener,
            registries,
            runner,
            settings,
        }
    }

    /// Accept peers until `cancel` fires.
    ///
    /// - Each accepted connection gets its own discovery task; the loop goes
    ///   straight back to accepting.
    /// - Cancellation is the normal way out and is not an error. Connections
    ///   that are already pending at that moment are still handed off; the
    ///   drain stops at the first gap longer than the configured grace.
    /// - An accept failure is fatal and returned to the caller.
    pub async fn run(mut self, cancel: CancellationToken) -> anyhow::Result<()> {
        info!("discovery acceptor started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("acceptor cancelled");
                    break;
                }

                accepted = self.listener.accept() => {
                    let conn = accepted.context("accepting discovery connection")?;
                    self.hand_off(conn);
                }
            }
        }

        let drained = self.drain_pending().await?;
        info!(
            drained,
            accepted = self.registries.discovery.spawned(),
            "discovery acceptor stopped"
        );
        Ok(())
    }

    /// Hand off connections that were already queued when cancellation hit.
    ///
    /// The grace gives the IO driver a chance to report readiness for a
    /// connection that sits in the listener backlog but has not been observed
    /// yet.
    async fn drain_pending(&mut self) -> anyhow::Result<usize> {
        let grace = self.settings.drain_grace;
        let mut drained = 0;
        loop {
            let accepted = match tokio::time::timeout(grace, self.listener.accept()).await {
                Ok(accepted) => accepted,
                Err(_elapsed) => break,
            };
            let conn = accepted.context("accepting pending discovery connection")?;
            self.hand_off(conn);
            drained += 1;
        }
        Ok(drained)
    }

    fn hand_off(&self, conn: Box<dyn Endpoint>) {
        let executor = self.registries.executor.clone();
        let runner = Arc::clone(&self.runner);
        let chunk_size = self.settings.read_buffer_size;
        debug!(seq = self.registries.discovery.spawned(), "peer connected");
        self.registries
            .discovery
            .spawn(discover(conn, executor, runner, chunk_size));
    }
}
