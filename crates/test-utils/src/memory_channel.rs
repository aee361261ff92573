//! In-memory discovery channel.
//!
//! `memory_channel()` returns a listener for the coordinator and a connector
//! that plays the peers. Each `send` creates a fresh duplex pipe, queues the
//! server half as a pending connection, writes the payload and closes.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;

use testrelay::channel::{ChannelListener, Endpoint};

pub struct MemoryListener {
    rx: mpsc::UnboundedReceiver<DuplexStream>,
    accepted: Arc<AtomicUsize>,
    fail_after: Option<usize>,
}

#[derive(Clone)]
pub struct MemoryConnector {
    tx: mpsc::UnboundedSender<DuplexStream>,
    accepted: Arc<AtomicUsize>,
}

pub fn memory_channel() -> (MemoryListener, MemoryConnector) {
    let (tx, rx) = mpsc::unbounded_channel();
    let accepted = Arc::new(AtomicUsize::new(0));
    (
        MemoryListener {
            rx,
            accepted: accepted.clone(),
            fail_after: None,
        },
        MemoryConnector { tx, accepted },
    )
}

impl MemoryListener {
    /// Make `accept` fail once `n` connections have been accepted, like a
    /// listener that can no longer create endpoints.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl ChannelListener for MemoryListener {
    fn accept(&mut self) -> Pin<Box<dyn Future<Output = io::Result<Box<dyn Endpoint>>> + Send + '_>> {
        Box::pin(async move {
            if let Some(limit) = self.fail_after {
                if self.accepted.load(Ordering::SeqCst) >= limit {
                    return Err(io::Error::other("cannot create listening endpoint"));
                }
            }
            match self.rx.recv().await {
                Some(stream) => {
                    self.accepted.fetch_add(1, Ordering::SeqCst);
                    Ok(Box::new(stream) as Box<dyn Endpoint>)
                }
                // Every connector is gone: behave like an idle listener.
                None => std::future::pending().await,
            }
        })
    }
}

impl MemoryConnector {
    /// Number of connections the listener has accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Connect, write `payload`, close.
    pub async fn send(&self, payload: &[u8]) -> io::Result<()> {
        let (mut client, server) = tokio::io::duplex(64);
        self.tx
            .send(server)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "listener dropped"))?;
        client.write_all(payload).await?;
        client.shutdown().await?;
        Ok(())
    }

    /// Like `send`, but writes in small pieces with pauses in between so
    /// concurrent peers interleave in time.
    pub async fn send_slowly(&self, payload: &[u8], piece: usize, pause: Duration) -> io::Result<()> {
        let (mut client, server) = tokio::io::duplex(64);
        self.tx
            .send(server)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "listener dropped"))?;
        for part in payload.chunks(piece.max(1)) {
            client.write_all(part).await?;
            tokio::time::sleep(pause).await;
        }
        client.shutdown().await?;
        Ok(())
    }

    /// Connect and close without writing anything.
    pub fn connect_and_close(&self) -> io::Result<()> {
        let (client, server) = tokio::io::duplex(64);
        self.tx
            .send(server)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "listener dropped"))?;
        drop(client);
        Ok(())
    }
}
