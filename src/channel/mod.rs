// src/channel/mod.rs

//! Discovery channel: the rendezvous between testrelay and build peers.
//!
//! - [`ChannelAddress`] is the per-run token handed to the build.
//! - [`ChannelListener`] produces one [`Endpoint`] per connected peer.
//! - [`bind`] creates the platform listener (Unix socket / named pipe).
//! - [`notify`] is the peer side: connect, write one path, close.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::config::ChannelSection;
use crate::errors::Result;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::socket_path;

/// Process-unique channel token; generated once per run and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelAddress(String);

impl ChannelAddress {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an address received from elsewhere (e.g. `notify --channel`).
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One accepted peer connection, read until the peer closes it.
pub trait Endpoint: AsyncRead + Unpin + Send {}

impl<T> Endpoint for T where T: AsyncRead + Unpin + Send {}

/// Source of accepted peer connections.
///
/// `accept` must be cancel safe: dropping the future before it resolves must
/// not lose a connection.
pub trait ChannelListener: Send {
    fn accept(&mut self) -> Pin<Box<dyn Future<Output = io::Result<Box<dyn Endpoint>>> + Send + '_>>;
}

/// Bind the platform listener for `address`.
///
/// Failure here is fatal for the run: nothing can be discovered without it.
pub fn bind(address: &ChannelAddress, cfg: &ChannelSection) -> Result<Box<dyn ChannelListener>> {
    #[cfg(unix)]
    {
        let _ = cfg;
        Ok(Box::new(unix::SocketListener::bind(address)?))
    }
    #[cfg(windows)]
    {
        Ok(Box::new(windows::PipeListener::bind(address, cfg.max_listeners)?))
    }
}

/// Peer side of the wire contract: connect to `address`, write `module`
/// followed by a newline, then close the write side.
pub async fn notify(address: &ChannelAddress, module: &str) -> Result<()> {
    #[cfg(unix)]
    {
        unix::notify(address, module).await
    }
    #[cfg(windows)]
    {
        windows::notify(address, module).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_addresses_are_unique_simple_uuids() {
        let a = ChannelAddress::generate();
        let b = ChannelAddress::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
