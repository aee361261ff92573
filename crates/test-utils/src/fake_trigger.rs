use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use testrelay::build::BuildTrigger;
use testrelay::channel::ChannelAddress;
use testrelay::errors::{RelayError, Result};
use testrelay::types::TriggerMode;

use crate::memory_channel::MemoryConnector;

/// A fake build that reports `modules` over the memory channel.
///
/// Peers are started concurrently, each after its own stagger delay, and the
/// trigger returns only once all of them have finished writing, matching the
/// guarantee a real build gives.
pub struct ScriptedTrigger {
    connector: MemoryConnector,
    modules: Vec<String>,
    stagger: Duration,
    seen: Arc<Mutex<Vec<(String, TriggerMode)>>>,
}

impl ScriptedTrigger {
    pub fn new(connector: MemoryConnector, modules: Vec<String>) -> Self {
        Self {
            connector,
            modules,
            stagger: Duration::ZERO,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delay peer `i` by `i * stagger` so discoveries arrive over time.
    pub fn staggered(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// `(channel, mode)` pairs this trigger was invoked with.
    pub fn invocations(&self) -> Arc<Mutex<Vec<(String, TriggerMode)>>> {
        self.seen.clone()
    }
}

impl BuildTrigger for ScriptedTrigger {
    fn trigger<'a>(
        &'a mut self,
        address: &'a ChannelAddress,
        mode: TriggerMode,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            self.seen
                .lock()
                .unwrap()
                .push((address.as_str().to_string(), mode));

            let mut peers = Vec::new();
            for (i, module) in self.modules.iter().cloned().enumerate() {
                let connector = self.connector.clone();
                let delay = self.stagger * i as u32;
                peers.push(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    connector.send(format!("{module}\n").as_bytes()).await
                }));
            }

            for peer in peers {
                peer.await
                    .map_err(|e| RelayError::Other(e.into()))??;
            }
            Ok(0)
        })
    }
}

/// A build that fails to start.
pub struct FailingTrigger;

impl BuildTrigger for FailingTrigger {
    fn trigger<'a>(
        &'a mut self,
        _address: &'a ChannelAddress,
        _mode: TriggerMode,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async { Err(RelayError::Other(anyhow::anyhow!("build program not found"))) })
    }
}

/// A build that never finishes on its own.
pub struct HangingTrigger;

impl BuildTrigger for HangingTrigger {
    fn trigger<'a>(
        &'a mut self,
        _address: &'a ChannelAddress,
        _mode: TriggerMode,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(std::future::pending())
    }
}

/// A build stand-in that reports modules through the real peer code path
/// ([`testrelay::channel::notify`]), one concurrent peer per module.
pub struct NotifyingTrigger {
    modules: Vec<String>,
}

impl NotifyingTrigger {
    pub fn new(modules: Vec<String>) -> Self {
        Self { modules }
    }
}

impl BuildTrigger for NotifyingTrigger {
    fn trigger<'a>(
        &'a mut self,
        address: &'a ChannelAddress,
        _mode: TriggerMode,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            let mut peers = Vec::new();
            for module in self.modules.iter().cloned() {
                let address = address.clone();
                peers.push(tokio::spawn(async move {
                    testrelay::channel::notify(&address, &module).await
                }));
            }
            for peer in peers {
                peer.await.map_err(|e| RelayError::Other(e.into()))??;
            }
            Ok(0)
        })
    }
}
