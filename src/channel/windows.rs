// src/channel/windows.rs

//! Named pipe transport.
//!
//! A single server instance is always pre-posted. When a peer connects to
//! it, a fresh instance is created to take its place before the connected one
//! is handed off, so the next peer never finds the pipe missing.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeServer, ServerOptions};
use tracing::debug;

use super::{ChannelAddress, ChannelListener, Endpoint};
use crate::errors::{RelayError, Result};

const ERROR_PIPE_BUSY: i32 = 231;

pub(crate) fn pipe_name(address: &ChannelAddress) -> String {
    format!(r"\\.\pipe\{address}")
}

pub(crate) struct PipeListener {
    name: String,
    max_instances: usize,
    server: NamedPipeServer,
}

impl PipeListener {
    pub(crate) fn bind(address: &ChannelAddress, max_instances: usize) -> Result<Self> {
        let name = pipe_name(address);
        let server = ServerOptions::new()
            .first_pipe_instance(true)
            .max_instances(max_instances)
            .create(&name)
            .map_err(|e| RelayError::ChannelError(format!("creating pipe {name}: {e}")))?;
        debug!(pipe = %name, "discovery pipe created");
        Ok(Self {
            name,
            max_instances,
            server,
        })
    }

    fn next_instance(&self) -> io::Result<NamedPipeServer> {
        ServerOptions::new()
            .max_instances(self.max_instances)
            .create(&self.name)
    }
}

impl ChannelListener for PipeListener {
    fn accept(&mut self) -> Pin<Box<dyn Future<Output = io::Result<Box<dyn Endpoint>>> + Send + '_>> {
        Box::pin(async move {
            self.server.connect().await?;
            let next = self.next_instance()?;
            let connected = std::mem::replace(&mut self.server, next);
            Ok(Box::new(connected) as Box<dyn Endpoint>)
        })
    }
}

/// How long a peer keeps retrying while every pipe instance is busy.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);
const BUSY_RETRY_DELAY: Duration = Duration::from_millis(50);

pub(crate) async fn notify(address: &ChannelAddress, module: &str) -> Result<()> {
    notify_within(address, module, BUSY_TIMEOUT).await
}

/// Like [`notify`], but gives up once the pipe has stayed busy for `busy_timeout`.
pub(crate) async fn notify_within(
    address: &ChannelAddress,
    module: &str,
    busy_timeout: Duration,
) -> Result<()> {
    let name = pipe_name(address);
    let open = async {
        loop {
            match ClientOptions::new().open(&name) {
                Ok(client) => return Ok(client),
                Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY) => {
                    tokio::time::sleep(BUSY_RETRY_DELAY).await;
                }
                Err(e) => {
                    return Err(anyhow::Error::from(e)
                        .context(format!("connecting to discovery pipe {name}")));
                }
            }
        }
    };
    let mut client = match tokio::time::timeout(busy_timeout, open).await {
        Ok(opened) => opened?,
        Err(_) => {
            return Err(RelayError::ChannelError(format!(
                "discovery pipe {name} stayed busy for {busy_timeout:?}"
            )));
        }
    };
    client
        .write_all(format!("{module}\n").as_bytes())
        .await
        .context("writing module path")?;
    client.shutdown().await.context("closing discovery connection")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn busy_pipe_gives_up_after_timeout() {
        let address = ChannelAddress::generate();
        let name = pipe_name(&address);
        // One instance only, already taken by another client.
        let server = ServerOptions::new()
            .first_pipe_instance(true)
            .max_instances(1)
            .create(&name)
            .unwrap();
        let _occupant = ClientOptions::new().open(&name).unwrap();

        let started = std::time::Instant::now();
        let result = notify_within(&address, "/build/out/A.dll", Duration::from_millis(200)).await;

        match result {
            Err(RelayError::ChannelError(msg)) => assert!(msg.contains("busy"), "{msg}"),
            other => panic!("expected busy ChannelError, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(server);
    }
}
