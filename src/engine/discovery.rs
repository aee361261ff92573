// src/engine/discovery.rs

//! Module discovery task: drain one peer connection into a module path.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::channel::Endpoint;
use crate::engine::registry::TaskRegistry;
use crate::exec::ModuleRunner;
use crate::types::ModuleId;

/// Read `conn` until the peer closes it and decode what arrived.
///
/// An empty payload yields an empty identifier. Invalid UTF-8 is replaced,
/// not rejected. Both buffers are owned here and released on every path.
pub async fn read_module_id<R>(conn: &mut R, chunk_size: usize) -> std::io::Result<ModuleId>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut message = Vec::new();

    loop {
        let n = conn.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        message.extend_from_slice(&chunk[..n]);
    }

    Ok(ModuleId::new(String::from_utf8_lossy(&message)))
}

/// Discovery task body: drain the connection, then register an executor
/// task for the module. The connection is closed before the hand-off.
pub async fn discover(
    mut conn: Box<dyn Endpoint>,
    executor: Arc<TaskRegistry>,
    runner: Arc<dyn ModuleRunner>,
    chunk_size: usize,
) -> anyhow::Result<()> {
    let module = read_module_id(&mut conn, chunk_size)
        .await
        .context("reading module path from discovery connection")?;
    drop(conn);

    debug!(module = %module, "module discovered");

    executor.spawn(async move { runner.run(module).await });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn reads_across_many_small_chunks() {
        let (mut client, mut server) = tokio::io::duplex(8);
        let writer = tokio::spawn(async move {
            client.write_all(b"/build/out/SomeLongerName.Tests.dll\n").await.unwrap();
        });

        let module = read_module_id(&mut server, 3).await.unwrap();
        writer.await.unwrap();

        assert_eq!(module.as_str(), "/build/out/SomeLongerName.Tests.dll");
    }

    #[tokio::test]
    async fn closed_without_data_yields_empty_identifier() {
        let (client, mut server) = tokio::io::duplex(8);
        drop(client);

        let module = read_module_id(&mut server, 4096).await.unwrap();
        assert!(module.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(b"/out/\xffbad.dll").await.unwrap();
        drop(client);

        let module = read_module_id(&mut server, 16).await.unwrap();
        assert_eq!(module.as_str(), "/out/\u{fffd}bad.dll");
    }
}
