//! Fan-out of one shared transport into per-room inboxes.
//!
//! Exactly one task runs [`MessageRouter::run`], so the socket has a single
//! reader. Every message whose first line is a `>ROOMID` marker goes to that
//! room's inbox; everything else goes to the lobby inbox.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};

use crate::lock;
use crate::transport::{Inbox, Transport};

pub struct MessageRouter<T> {
    transport: Arc<T>,
    rooms: Mutex<HashMap<String, mpsc::UnboundedSender<String>>>,
    lobby_tx: mpsc::UnboundedSender<String>,
    lobby_rx: Mutex<Option<Inbox>>,
    stop_tx: watch::Sender<bool>,
}

impl<T: Transport> MessageRouter<T> {
    pub fn new(transport: Arc<T>) -> Self {
        let (lobby_tx, lobby_rx) = mpsc::unbounded_channel();
        let (stop_tx, _) = watch::channel(false);

        Self {
            transport,
            rooms: Mutex::new(HashMap::new()),
            lobby_tx,
            lobby_rx: Mutex::new(Some(lobby_rx)),
            stop_tx,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// The lobby inbox. Handed out once; later calls return `None`.
    pub fn take_lobby(&self) -> Option<Inbox> {
        lock(&self.lobby_rx).take()
    }

    /// Route messages for `room` into `inbox`, replacing any earlier inbox
    pub fn register(&self, room: impl Into<String>, inbox: mpsc::UnboundedSender<String>) {
        let room = room.into();
        tracing::info!(room = %room, "Registered room");
        lock(&self.rooms).insert(room, inbox);
    }

    pub fn unregister(&self, room: &str) {
        if lock(&self.rooms).remove(room).is_some() {
            tracing::info!(room, "Unregistered room");
        }
    }

    pub fn is_registered(&self, room: &str) -> bool {
        lock(&self.rooms).contains_key(room)
    }

    /// Deliver one transport message to its inbox
    pub fn route(&self, message: String) {
        if message.trim().is_empty() {
            return;
        }

        let Some(room) = room_marker(&message) else {
            if self.lobby_tx.send(message).is_err() {
                tracing::debug!("Lobby inbox dropped, message discarded");
            }
            return;
        };

        let inbox = lock(&self.rooms).get(room).cloned();
        match inbox {
            Some(inbox) => {
                let room = room.to_string();
                if inbox.send(message).is_err() {
                    tracing::warn!(room = %room, "Inbox closed, message dropped");
                } else {
                    tracing::trace!(room = %room, "Routed message");
                }
            }
            None => tracing::warn!(room, "No inbox registered for room, message dropped"),
        }
    }

    /// Read from the transport until it closes, fails, or [`stop`](Self::stop)
    /// is called
    pub async fn run(&self) {
        let mut stop = self.stop_tx.subscribe();
        let stopped = *stop.borrow();
        if stopped {
            return;
        }

        tracing::info!("Starting message routing loop");

        while self.transport.is_connected() {
            let received = tokio::select! {
                _ = stop.changed() => break,
                received = self.transport.recv() => received,
            };

            match received {
                Ok(Some(message)) => self.route(message),
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Error receiving message");
                    break;
                }
            }
        }

        tracing::info!("Message routing loop ended");
    }

    pub fn stop(&self) {
        tracing::info!("Stopping message router");
        self.stop_tx.send_replace(true);
    }
}

/// Room named by a leading `>ROOMID` line
fn room_marker(message: &str) -> Option<&str> {
    message
        .lines()
        .next()
        .and_then(|line| line.strip_prefix('>'))
        .map(str::trim)
        .filter(|room| !room.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LocalTransport;

    fn router() -> (Arc<MessageRouter<LocalTransport>>, crate::transport::RemoteEnd) {
        let (transport, remote) = LocalTransport::pair();
        (Arc::new(MessageRouter::new(Arc::new(transport))), remote)
    }

    #[test]
    fn test_room_marker() {
        assert_eq!(room_marker(">battle-gen9ou-1\n|turn|1"), Some("battle-gen9ou-1"));
        assert_eq!(room_marker("|updatesearch|{}"), None);
        assert_eq!(room_marker(">\n|turn|1"), None);
    }

    #[tokio::test]
    async fn test_routes_by_room_and_lobby() {
        let (router, _remote) = router();
        let mut lobby = router.take_lobby().unwrap();
        assert!(router.take_lobby().is_none());

        let (tx, mut inbox) = mpsc::unbounded_channel();
        router.register("battle-1", tx);

        router.route(">battle-1\n|turn|1".to_string());
        router.route("|challstr|4|abc".to_string());
        router.route("   ".to_string());

        assert_eq!(inbox.recv().await.as_deref(), Some(">battle-1\n|turn|1"));
        assert_eq!(lobby.recv().await.as_deref(), Some("|challstr|4|abc"));
        assert!(lobby.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregistered_room_is_dropped() {
        let (router, _remote) = router();
        let mut lobby = router.take_lobby().unwrap();
        let (tx, mut inbox) = mpsc::unbounded_channel();

        router.register("battle-1", tx);
        assert!(router.is_registered("battle-1"));
        router.unregister("battle-1");
        assert!(!router.is_registered("battle-1"));

        router.route(">battle-1\n|win|Alice".to_string());
        assert!(inbox.try_recv().is_err());
        assert!(lobby.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_run_until_transport_closes() {
        let (router, remote) = router();
        let (tx, mut inbox) = mpsc::unbounded_channel();
        router.register("battle-2", tx);

        remote.to_client.send(">battle-2\n|turn|3".to_string()).unwrap();
        remote.to_client.send(">battle-9\n|turn|1".to_string()).unwrap();
        drop(remote);

        router.run().await;
        assert_eq!(inbox.recv().await.as_deref(), Some(">battle-2\n|turn|3"));
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stop_ends_loop() {
        let (router, _remote) = router();
        let task = tokio::spawn({
            let router = router.clone();
            async move { router.run().await }
        });

        tokio::task::yield_now().await;
        router.stop();
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}
