//! Transport seam between the client and the server connection.
//!
//! A [`Transport`] is a shared, already-connected message pipe. It hands out
//! whole transport messages (possibly several newline-joined protocol lines)
//! and accepts outbound command strings. Handshakes and login are the
//! caller's business.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow};
use tokio::sync::{Mutex, mpsc};

/// Per-room inbox filled by the [`MessageRouter`](crate::MessageRouter)
pub type Inbox = mpsc::UnboundedReceiver<String>;

pub trait Transport: Send + Sync + 'static {
    fn is_connected(&self) -> bool;

    /// Next transport message, `None` once the connection has closed
    fn recv(&self) -> impl Future<Output = Result<Option<String>>> + Send;

    fn send(&self, message: String) -> impl Future<Output = Result<()>> + Send;
}

/// Anything a [`BattleStream`](crate::BattleStream) can pull raw messages from
pub trait MessageSource: Send {
    /// Next raw message, `None` once the source is exhausted
    fn next_message(&mut self) -> impl Future<Output = Option<String>> + Send;
}

impl MessageSource for Inbox {
    async fn next_message(&mut self) -> Option<String> {
        self.recv().await
    }
}

/// Reading straight off a shared transport. Only sound when nothing else
/// (such as a router) is reading from it too.
impl<T: Transport> MessageSource for Arc<T> {
    async fn next_message(&mut self) -> Option<String> {
        match self.recv().await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Transport receive failed, ending stream");
                None
            }
        }
    }
}

/// In-process transport backed by unbounded channels.
///
/// The paired [`RemoteEnd`] plays the server: whatever it pushes into
/// `to_client` comes out of [`Transport::recv`], and every
/// [`Transport::send`] lands in `from_client`.
pub struct LocalTransport {
    inbound: Mutex<Inbox>,
    outbound: mpsc::UnboundedSender<String>,
    connected: AtomicBool,
}

/// Server side of a [`LocalTransport`]
pub struct RemoteEnd {
    pub to_client: mpsc::UnboundedSender<String>,
    pub from_client: mpsc::UnboundedReceiver<String>,
}

impl LocalTransport {
    pub fn pair() -> (Self, RemoteEnd) {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();

        let transport = Self {
            inbound: Mutex::new(inbound),
            outbound,
            connected: AtomicBool::new(true),
        };

        (
            transport,
            RemoteEnd {
                to_client,
                from_client,
            },
        )
    }
}

impl Transport for LocalTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn recv(&self) -> Result<Option<String>> {
        let message = self.inbound.lock().await.recv().await;
        if message.is_none() {
            self.connected.store(false, Ordering::Release);
        }
        Ok(message)
    }

    async fn send(&self, message: String) -> Result<()> {
        self.outbound.send(message).map_err(|_| {
            self.connected.store(false, Ordering::Release);
            anyhow!("Connection closed")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_transport_round_trip() {
        let (transport, mut remote) = LocalTransport::pair();

        remote.to_client.send(">battle-1\n|turn|1".to_string()).unwrap();
        assert_eq!(
            transport.recv().await.unwrap().as_deref(),
            Some(">battle-1\n|turn|1")
        );

        transport.send("|/search gen9randombattle".to_string()).await.unwrap();
        assert_eq!(
            remote.from_client.recv().await.as_deref(),
            Some("|/search gen9randombattle")
        );
    }

    #[tokio::test]
    async fn test_local_transport_disconnects_when_server_hangs_up() {
        let (transport, remote) = LocalTransport::pair();
        assert!(transport.is_connected());

        drop(remote);
        assert_eq!(transport.recv().await.unwrap(), None);
        assert!(!transport.is_connected());
        assert!(transport.send("|/noop".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_shared_transport_as_message_source() {
        let (transport, remote) = LocalTransport::pair();
        let mut source = Arc::new(transport);

        remote.to_client.send("|turn|4".to_string()).unwrap();
        drop(remote);

        assert_eq!(source.next_message().await.as_deref(), Some("|turn|4"));
        assert_eq!(source.next_message().await, None);
    }
}
