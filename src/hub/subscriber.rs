//! Subscriber handles
//!
//! A subscriber is split in two: the hub keeps the sending half of the
//! outbound queue in its registry, the session keeps the receiving half.
//! Dropping the entry is how the hub closes the queue. The entry also holds a
//! closure signal, so a session blocked on a write can still see it happen.

use tokio::sync::{mpsc, oneshot};

use super::event::Frame;

/// Unique identifier for a subscriber
pub type SubscriberId = u64;

/// Registry entry: the hub's side of one subscriber
#[derive(Debug)]
pub(super) struct SubscriberEntry {
    pub(super) tx: mpsc::Sender<Frame>,
    // Never sent on; dropped with the entry
    _closer: oneshot::Sender<()>,
}

/// Create both halves of a subscriber with a queue of `capacity` frames
pub(super) fn pair(id: SubscriberId, capacity: usize) -> (SubscriberEntry, Subscription) {
    let (tx, rx) = mpsc::channel(capacity);
    let (closer, closed) = oneshot::channel();

    let entry = SubscriberEntry {
        tx,
        _closer: closer,
    };
    let subscription = Subscription {
        id,
        rx,
        closed: Some(closed),
    };

    (entry, subscription)
}

/// The session's side of one subscriber
///
/// Yields queued frames in broadcast order. `recv()` returns `None` once the
/// hub has closed the queue (unregistration or eviction) and every frame
/// queued before that has been taken.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Frame>,
    closed: Option<oneshot::Receiver<()>>,
}

impl Subscription {
    /// The subscriber's id, used to unregister it
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next frame, or `None` once the queue is closed
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Wait until the hub has removed this subscriber
    ///
    /// Resolves as soon as the registry entry is dropped, even while frames
    /// are still queued. Cancel safe.
    pub async fn closed(&mut self) {
        if let Some(closed) = self.closed.as_mut() {
            let _ = closed.await;
            self.closed = None;
        }
    }

    /// Take a frame if one is queued, without waiting
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }

    /// Number of frames waiting in the queue
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
