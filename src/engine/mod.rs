// src/engine/mod.rs

//! Orchestration engine for testrelay.
//!
//! This module ties together:
//! - the acceptor loop that turns peer connections into discovery tasks
//! - discovery tasks that turn a drained connection into an executor task
//! - the registries that track both kinds of tasks
//! - the coordinator deciding when all work is actually done

use std::time::Duration;

use crate::config::ChannelSection;

pub mod acceptor;
pub mod coordinator;
pub mod discovery;
pub mod registry;

pub use acceptor::Acceptor;
pub use coordinator::{Coordinator, RunSummary};
pub use discovery::{discover, read_module_id};
pub use registry::{Registries, TaskRegistry};

/// Tuning shared by the acceptor and its discovery tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoverySettings {
    /// Chunk size for draining one connection.
    pub read_buffer_size: usize,
    /// How long the stopping acceptor keeps waiting for already-queued
    /// connections.
    pub drain_grace: Duration,
}

impl DiscoverySettings {
    pub fn from_config(cfg: &ChannelSection) -> Self {
        Self {
            read_buffer_size: cfg.read_buffer_size,
            drain_grace: Duration::from_millis(cfg.drain_grace_ms),
        }
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self::from_config(&ChannelSection::default())
    }
}
