//! Scripted upstream feed for tests
//!
//! Every connect attempt made through [`MockConnector`] shows up on the
//! paired [`MockUpstream`] as a [`PendingConnect`], which the test accepts or
//! rejects. An accepted connection is driven through its [`FeedHandle`].

use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch};

use super::connector::{Feed, FeedConnector};
use crate::error::{Error, Result};

pub(crate) fn mock_upstream() -> (MockConnector, MockUpstream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MockConnector { attempts: tx }, MockUpstream { attempts: rx })
}

fn io_error(kind: io::ErrorKind, msg: &str) -> Error {
    Error::Io(io::Error::new(kind, msg.to_string()))
}

pub(crate) struct MockConnector {
    attempts: mpsc::UnboundedSender<PendingConnect>,
}

impl FeedConnector for MockConnector {
    type Feed = MockFeed;

    async fn connect(&self, url: &str) -> Result<MockFeed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let pending = PendingConnect {
            url: url.to_string(),
            reply: reply_tx,
        };

        self.attempts
            .send(pending)
            .map_err(|_| io_error(io::ErrorKind::ConnectionRefused, "mock upstream gone"))?;

        reply_rx
            .await
            .map_err(|_| io_error(io::ErrorKind::ConnectionRefused, "connect dropped"))?
    }
}

pub(crate) struct MockUpstream {
    attempts: mpsc::UnboundedReceiver<PendingConnect>,
}

impl MockUpstream {
    /// Wait for the supervisor's next connect attempt
    pub(crate) async fn next_attempt(&mut self) -> PendingConnect {
        tokio::time::timeout(Duration::from_secs(60), self.attempts.recv())
            .await
            .expect("no connect attempt")
            .expect("connector dropped")
    }

    /// True if a connect attempt arrives within `window`
    pub(crate) async fn attempt_within(&mut self, window: Duration) -> Option<PendingConnect> {
        tokio::time::timeout(window, self.attempts.recv())
            .await
            .ok()
            .flatten()
    }
}

pub(crate) struct PendingConnect {
    pub(crate) url: String,
    reply: oneshot::Sender<Result<MockFeed>>,
}

impl PendingConnect {
    pub(crate) fn accept(self) -> FeedHandle {
        self.open(false)
    }

    /// Accept, but fail every send on the connection
    pub(crate) fn accept_failing_send(self) -> FeedHandle {
        self.open(true)
    }

    pub(crate) fn reject(self) {
        let _ = self.reply.send(Err(io_error(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        )));
    }

    fn open(self, fail_send: bool) -> FeedHandle {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = watch::channel(false);

        let feed = MockFeed {
            incoming: incoming_rx,
            sent: sent_tx,
            closed: closed_tx,
            fail_send,
        };
        let _ = self.reply.send(Ok(feed));

        FeedHandle {
            incoming: Some(incoming_tx),
            sent: sent_rx,
            closed: closed_rx,
        }
    }
}

pub(crate) struct MockFeed {
    incoming: mpsc::UnboundedReceiver<Result<Bytes>>,
    sent: mpsc::UnboundedSender<String>,
    closed: watch::Sender<bool>,
    fail_send: bool,
}

impl Feed for MockFeed {
    async fn send_text(&mut self, text: String) -> Result<()> {
        if self.fail_send {
            return Err(io_error(io::ErrorKind::BrokenPipe, "send failed"));
        }
        let _ = self.sent.send(text);
        Ok(())
    }

    async fn next_message(&mut self) -> Option<Result<Bytes>> {
        self.incoming.recv().await
    }

    async fn close(self) {
        self.closed.send_replace(true);
    }
}

/// Test side of one accepted connection
pub(crate) struct FeedHandle {
    incoming: Option<mpsc::UnboundedSender<Result<Bytes>>>,
    sent: mpsc::UnboundedReceiver<String>,
    closed: watch::Receiver<bool>,
}

impl FeedHandle {
    /// Deliver a raw message to the supervisor
    pub(crate) fn push(&self, raw: &str) {
        if let Some(tx) = &self.incoming {
            let _ = tx.send(Ok(Bytes::copy_from_slice(raw.as_bytes())));
        }
    }

    /// Make the next read fail
    pub(crate) fn fail_read(&self) {
        if let Some(tx) = &self.incoming {
            let _ = tx.send(Err(io_error(io::ErrorKind::ConnectionReset, "reset by peer")));
        }
    }

    /// End the stream from the feed's side
    pub(crate) fn end_stream(&mut self) {
        self.incoming.take();
    }

    /// Next text message the supervisor sent
    pub(crate) async fn sent(&mut self) -> Option<String> {
        self.sent.recv().await
    }

    /// Wait until the supervisor closes the connection
    pub(crate) async fn wait_closed(&mut self) -> bool {
        let window = Duration::from_secs(60);
        matches!(
            tokio::time::timeout(window, self.closed.wait_for(|closed| *closed)).await,
            Ok(Ok(_))
        )
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

/// A position report as the feed sends it
pub(crate) fn position_report(name: &str, latitude: f64, longitude: f64) -> String {
    format!(
        r#"{{"MessageType":"PositionReport","MetaData":{{"ShipName":"{}"}},"Message":{{"PositionReport":{{"Latitude":{},"Longitude":{}}}}}}}"#,
        name, latitude, longitude
    )
}
