// src/channel/unix.rs

//! Unix domain socket transport.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

use super::{ChannelAddress, ChannelListener, Endpoint};
use crate::errors::{RelayError, Result};

/// Socket file backing `address`.
pub fn socket_path(address: &ChannelAddress) -> PathBuf {
    std::env::temp_dir().join(format!("testrelay-{address}.sock"))
}

/// A bound Unix socket; the kernel backlog holds connections not yet accepted.
pub(crate) struct SocketListener {
    listener: UnixListener,
    path: PathBuf,
}

impl SocketListener {
    pub(crate) fn bind(address: &ChannelAddress) -> Result<Self> {
        let path = socket_path(address);
        let listener = UnixListener::bind(&path).map_err(|e| {
            RelayError::ChannelError(format!("binding {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "discovery socket bound");
        Ok(Self { listener, path })
    }
}

impl ChannelListener for SocketListener {
    fn accept(&mut self) -> Pin<Box<dyn Future<Output = io::Result<Box<dyn Endpoint>>> + Send + '_>> {
        Box::pin(async move {
            let (stream, _addr) = self.listener.accept().await?;
            Ok(Box::new(stream) as Box<dyn Endpoint>)
        })
    }
}

impl Drop for SocketListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove discovery socket");
        }
    }
}

pub(crate) async fn notify(address: &ChannelAddress, module: &str) -> Result<()> {
    let path = socket_path(address);
    let mut stream = UnixStream::connect(&path)
        .await
        .with_context(|| format!("connecting to discovery socket {}", path.display()))?;
    stream
        .write_all(format!("{module}\n").as_bytes())
        .await
        .context("writing module path")?;
    stream.shutdown().await.context("closing discovery connection")?;
    Ok(())
}
