use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::transport::Transport;

/// Public Showdown websocket endpoint
pub const SHOWDOWN_URL: &str = "wss://sim3.psim.us/showdown/websocket";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket [`Transport`].
///
/// Reads and writes go through separate halves so a send never waits on a
/// pending receive.
pub struct WsTransport {
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    connected: AtomicBool,
    url: String,
}

impl WsTransport {
    /// Connect to a websocket URL
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _response) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        let (sink, stream) = ws.split();

        tracing::info!(url, "Connected");

        Ok(Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            connected: AtomicBool::new(true),
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a close frame and mark the transport disconnected
    pub async fn close(&self) -> Result<()> {
        self.connected.store(false, Ordering::Release);
        self.sink
            .lock()
            .await
            .close()
            .await
            .context("Failed to close websocket")
    }
}

impl Transport for WsTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn recv(&self) -> Result<Option<String>> {
        let mut stream = self.stream.lock().await;

        while let Some(message) = stream.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    self.connected.store(false, Ordering::Release);
                    return Err(e).context("WebSocket error");
                }
            };

            match message {
                Message::Text(text) => return Ok(Some(text)),
                Message::Close(_) => break,
                Message::Ping(data) => self
                    .sink
                    .lock()
                    .await
                    .send(Message::Pong(data))
                    .await
                    .context("Failed to send pong")?,
                _ => {}
            }
        }

        tracing::info!(url = %self.url, "Connection closed");
        self.connected.store(false, Ordering::Release);
        Ok(None)
    }

    async fn send(&self, message: String) -> Result<()> {
        tracing::debug!(%message, "Sending");
        self.sink
            .lock()
            .await
            .send(Message::Text(message))
            .await
            .context("Failed to send message")
    }
}
