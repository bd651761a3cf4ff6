//! Subscriber session pumps

use std::time::Duration;

use crate::hub::{Hub, SubscriberId, Subscription};

use super::transport::{FrameSink, FrameSource};

/// How long the outbound pump may keep flushing after the peer has gone
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest the outbound pump waits for the connection to close
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// One downstream subscriber, registered with the hub
pub struct Session {
    hub: Hub,
    subscription: Subscription,
}

impl Session {
    /// Register a new subscriber with the hub
    ///
    /// The subscriber receives every broadcast from this point on, before
    /// either pump has started.
    pub async fn open(hub: Hub) -> Self {
        let subscription = hub.register().await;
        Self { hub, subscription }
    }

    /// The subscriber's id
    pub fn id(&self) -> SubscriberId {
        self.subscription.id()
    }

    /// Run both pumps until the session ends
    ///
    /// Whichever pump stops first ends the session: the subscriber is
    /// unregistered and both halves of the connection are released.
    pub async fn run<W, R>(self, sink: W, source: R)
    where
        W: FrameSink,
        R: FrameSource,
    {
        let id = self.subscription.id();
        let mut outbound = tokio::spawn(outbound_pump(self.hub.clone(), self.subscription, sink));
        let mut inbound = tokio::spawn(inbound_pump(self.hub, id, source));

        tokio::select! {
            _ = &mut outbound => {
                inbound.abort();
                let _ = inbound.await;
            }
            _ = &mut inbound => {
                // Unregistered; the outbound pump sees its queue close
                if tokio::time::timeout(DRAIN_TIMEOUT, &mut outbound).await.is_err() {
                    tracing::debug!(subscriber_id = id, "Outbound pump stuck, aborting");
                    outbound.abort();
                    let _ = outbound.await;
                }
            }
        }

        tracing::debug!(subscriber_id = id, "Session ended");
    }
}

/// Forward queued frames to the peer until the queue closes or a write fails
///
/// A write still pending when the hub removes the subscriber is abandoned,
/// so an evicted peer that stopped reading cannot hold the session open.
async fn outbound_pump<W: FrameSink>(hub: Hub, mut subscription: Subscription, mut sink: W) {
    let id = subscription.id();
    let mut sent: u64 = 0;

    while let Some(frame) = subscription.recv().await {
        tokio::select! {
            written = sink.send_text(&frame) => {
                if let Err(e) = written {
                    tracing::debug!(subscriber_id = id, error = %e, "Downstream write failed");
                    break;
                }
            }
            _ = subscription.closed() => {
                tracing::debug!(subscriber_id = id, "Removed by hub during write");
                break;
            }
        }
        sent += 1;
    }

    hub.unregister(id).await;
    if tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await.is_err() {
        tracing::debug!(subscriber_id = id, "Downstream close timed out");
    }

    tracing::debug!(subscriber_id = id, frames_sent = sent, "Outbound pump finished");
}

/// Read until the peer goes away; frame contents are ignored
async fn inbound_pump<R: FrameSource>(hub: Hub, id: SubscriberId, mut source: R) {
    while source.next_frame().await {}

    hub.unregister(id).await;

    tracing::debug!(subscriber_id = id, "Inbound pump finished");
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::error::{Error, Result};
    use crate::hub::{Frame, HubConfig, PositionEvent};

    struct MemorySink {
        frames: mpsc::UnboundedSender<String>,
        closed: Arc<AtomicBool>,
        fail_writes: bool,
    }

    impl FrameSink for MemorySink {
        async fn send_text(&mut self, frame: &Frame) -> Result<()> {
            if self.fail_writes {
                return Err(Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")));
            }
            let _ = self.frames.send(frame.to_string());
            Ok(())
        }

        async fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    /// Each `()` sent on the paired channel is one client frame; dropping
    /// the sender closes the connection
    struct MemorySource(mpsc::UnboundedReceiver<()>);

    impl FrameSource for MemorySource {
        async fn next_frame(&mut self) -> bool {
            self.0.recv().await.is_some()
        }
    }

    struct Peer {
        frames: mpsc::UnboundedReceiver<String>,
        closed: Arc<AtomicBool>,
        client: mpsc::UnboundedSender<()>,
    }

    fn connection(fail_writes: bool) -> (MemorySink, MemorySource, Peer) {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (client_tx, client_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        let sink = MemorySink {
            frames: frames_tx,
            closed: Arc::clone(&closed),
            fail_writes,
        };
        let peer = Peer {
            frames: frames_rx,
            closed,
            client: client_tx,
        };

        (sink, MemorySource(client_rx), peer)
    }

    /// A peer that stopped reading: writes and close never complete
    struct StalledSink;

    impl FrameSink for StalledSink {
        async fn send_text(&mut self, _frame: &Frame) -> Result<()> {
            std::future::pending().await
        }

        async fn close(&mut self) {
            std::future::pending::<()>().await
        }
    }

    fn event(name: &str) -> PositionEvent {
        PositionEvent::new(name, 1.0, 2.0)
    }

    async fn ended(session: tokio::task::JoinHandle<()>) {
        tokio::time::timeout(Duration::from_secs(1), session)
            .await
            .expect("session did not end")
            .unwrap();
    }

    #[tokio::test]
    async fn test_registered_before_pumps_start() {
        let hub = Hub::spawn(HubConfig::default());
        let session = Session::open(hub.clone()).await;

        assert_eq!(hub.active_count(), 1);
        assert!(session.id() > 0);
    }

    #[tokio::test]
    async fn test_forwards_frames_in_order() {
        let hub = Hub::spawn(HubConfig::default());
        let (sink, source, mut peer) = connection(false);
        let session = Session::open(hub.clone()).await;
        tokio::spawn(session.run(sink, source));

        for name in ["a", "b", "c"] {
            hub.broadcast(event(name)).await;
        }

        for name in ["a", "b", "c"] {
            let text = peer.frames.recv().await.unwrap();
            assert_eq!(
                text,
                format!(r#"{{"name":"{}","latitude":1.0,"longitude":2.0}}"#, name)
            );
        }
    }

    #[tokio::test]
    async fn test_client_frames_ignored() {
        let hub = Hub::spawn(HubConfig::default());
        let (sink, source, mut peer) = connection(false);
        let session = Session::open(hub.clone()).await;
        tokio::spawn(session.run(sink, source));

        peer.client.send(()).unwrap();
        peer.client.send(()).unwrap();
        hub.broadcast(event("still-here")).await;

        assert!(peer.frames.recv().await.unwrap().contains("still-here"));
        assert_eq!(hub.active_count(), 1);
    }

    #[tokio::test]
    async fn test_peer_close_ends_session() {
        let hub = Hub::spawn(HubConfig::default());
        let (sink, source, peer) = connection(false);
        let session = Session::open(hub.clone()).await;
        let running = tokio::spawn(session.run(sink, source));

        drop(peer.client);
        ended(running).await;

        assert_eq!(hub.active_count(), 0);
        assert!(peer.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_write_failure_ends_session() {
        let hub = Hub::spawn(HubConfig::default());
        let (sink, source, peer) = connection(true);
        let session = Session::open(hub.clone()).await;
        let running = tokio::spawn(session.run(sink, source));

        hub.broadcast(event("x")).await;
        ended(running).await;

        assert_eq!(hub.active_count(), 0);
        assert!(peer.closed.load(Ordering::SeqCst));
        // Inbound pump was aborted, releasing the read half
        assert!(peer.client.is_closed());
    }

    #[tokio::test]
    async fn test_closed_queue_ends_session() {
        let hub = Hub::spawn(HubConfig::default());
        let (sink, source, peer) = connection(false);
        let session = Session::open(hub.clone()).await;
        let id = session.id();
        let running = tokio::spawn(session.run(sink, source));

        // Same path as a backpressure eviction: the hub closes the queue
        hub.unregister(id).await;
        ended(running).await;

        assert!(peer.closed.load(Ordering::SeqCst));
        assert!(peer.client.is_closed());
        assert_eq!(hub.stats().await.unregistered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_ends_session_with_stalled_write() {
        let hub = Hub::spawn(HubConfig::default().queue_capacity(2));
        let (_, source, peer) = connection(false);
        let session = Session::open(hub.clone()).await;
        let running = tokio::spawn(session.run(StalledSink, source));

        // One frame stuck in the write, two queued, the rest overflow
        for n in 0..5 {
            hub.broadcast(event(&n.to_string())).await;
        }

        tokio::time::timeout(Duration::from_secs(60), running)
            .await
            .expect("session did not end after eviction")
            .unwrap();

        let stats = hub.stats().await;
        assert_eq!(stats.evicted, 1);
        assert_eq!(stats.active_subscribers, 0);
        // Both halves of the connection were released
        assert!(peer.client.is_closed());
    }
}
