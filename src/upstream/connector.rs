//! Upstream feed connections
//!
//! [`FeedConnector`] and [`Feed`] are the seam between the supervisor and the
//! transport. [`WsConnector`] is the production implementation over
//! tokio-tungstenite (TLS via rustls).

use std::future::Future;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::Result;

/// Opens connections to the upstream feed
pub trait FeedConnector: Send + Sync + 'static {
    /// Connection type produced by this connector
    type Feed: Feed;

    /// Connect to the feed at `url`
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Feed>> + Send;
}

/// One open upstream connection
pub trait Feed: Send + 'static {
    /// Send a text message
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next data message
    ///
    /// Returns `None` once the feed has closed the stream. Must be cancel
    /// safe: the supervisor bounds every read with a timeout.
    fn next_message(&mut self) -> impl Future<Output = Option<Result<Bytes>>> + Send;

    /// Close the connection
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// WebSocket connector for the real feed
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl FeedConnector for WsConnector {
    type Feed = WsFeed;

    async fn connect(&self, url: &str) -> Result<WsFeed> {
        let (stream, response) = tokio_tungstenite::connect_async(url).await?;

        tracing::debug!(status = %response.status(), "Upstream handshake complete");

        Ok(WsFeed { stream })
    }
}

/// An open WebSocket connection to the feed
pub struct WsFeed {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Feed for WsFeed {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_message(&mut self) -> Option<Result<Bytes>> {
        loop {
            // aisstream delivers JSON in binary frames; accept both
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Bytes::from(text))),
                Ok(Message::Binary(data)) => return Some(Ok(Bytes::from(data))),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(frame = ?frame, "Upstream sent close frame");
                    return None;
                }
                // Ping/pong are answered by tungstenite
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "Error closing upstream connection");
        }
    }
}
