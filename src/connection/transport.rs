use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// Opens stream connections. Implemented over WebSocket in production and by
/// in-memory fakes in tests.
#[async_trait]
pub trait StreamConnector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>>;
}

/// One open, text-framed connection
#[async_trait]
pub trait FrameStream: Send {
    /// Next text frame. `None` once the peer has closed the connection.
    async fn next_frame(&mut self) -> Option<Result<String>>;

    async fn send_frame(&mut self, frame: String) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// WebSocket connector (ws:// and wss://)
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>> {
        let (socket, response) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        debug!(status = %response.status(), "WebSocket handshake complete");
        Ok(Box::new(WsFrameStream { socket }))
    }
}

struct WsFrameStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameStream for WsFrameStream {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    debug!(frame = ?frame, "WebSocket closed by peer");
                    return None;
                }
                Ok(_) => {
                    // Binary, ping and pong frames; tungstenite answers pings itself
                }
                Err(e) => return Some(Err(anyhow!(e).context("WebSocket read failed"))),
            }
        }
    }

    async fn send_frame(&mut self, frame: String) -> Result<()> {
        self.socket
            .send(Message::Text(frame))
            .await
            .context("WebSocket send failed")
    }

    async fn close(&mut self) -> Result<()> {
        self.socket
            .close(None)
            .await
            .context("WebSocket close failed")
    }
}
