//! Downstream transport seam
//!
//! A session drives the two halves of a message-framed connection: a
//! [`FrameSink`] for outbound text frames and a [`FrameSource`] read only to
//! notice when the peer goes away. Both are implemented for the halves of a
//! split axum [`WebSocket`].

use std::future::Future;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use crate::error::Result;
use crate::hub::Frame;

/// Write half of a downstream connection
pub trait FrameSink: Send + 'static {
    /// Write one frame as a text message
    fn send_text(&mut self, frame: &Frame) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Read half of a downstream connection
pub trait FrameSource: Send + 'static {
    /// Wait for the next inbound frame, whatever it holds
    ///
    /// Returns `false` once the peer has closed the connection or it failed.
    fn next_frame(&mut self) -> impl Future<Output = bool> + Send;
}

impl FrameSink for SplitSink<WebSocket, Message> {
    async fn send_text(&mut self, frame: &Frame) -> Result<()> {
        self.send(Message::Text(frame.as_str().to_owned())).await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = SinkExt::close(self).await {
            tracing::trace!(error = %e, "Error closing downstream connection");
        }
    }
}

impl FrameSource for SplitStream<WebSocket> {
    async fn next_frame(&mut self) -> bool {
        match self.next().await {
            Some(Ok(Message::Close(_))) | None => false,
            Some(Ok(_)) => true,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Downstream read error");
                false
            }
        }
    }
}
