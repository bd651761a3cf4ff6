//! Hub implementation
//!
//! The registry lives inside a single task, the hub loop. Every other
//! component talks to it through a cloneable [`Hub`] handle that posts
//! commands to the loop's mailbox, so registration, unregistration and the
//! removals made while broadcasting never race and no broadcast sees a
//! half-updated registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};

use super::config::HubConfig;
use super::event::PositionEvent;
use super::subscriber::{self, SubscriberEntry, SubscriberId, Subscription};
use crate::stats::HubStats;

/// Requests handled by the hub loop
enum HubCommand {
    Register {
        id: SubscriberId,
        entry: SubscriberEntry,
        ack: oneshot::Sender<()>,
    },
    Unregister {
        id: SubscriberId,
        ack: oneshot::Sender<()>,
    },
    Broadcast(PositionEvent),
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
}

/// Handle to the subscriber hub
///
/// Cheap to clone. The hub loop stops once every handle has been dropped,
/// closing the queues of any subscribers still registered.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::Sender<HubCommand>,
    active: watch::Receiver<usize>,
    next_id: Arc<AtomicU64>,
    queue_capacity: usize,
}

impl Hub {
    /// Create a hub handle and the loop that serves it
    ///
    /// The loop does nothing until [`HubLoop::run`] is awaited; most callers
    /// want [`Hub::spawn`].
    pub fn new(config: HubConfig) -> (Self, HubLoop) {
        let (commands_tx, commands_rx) = mpsc::channel(config.mailbox_capacity.max(1));
        let (active_tx, active_rx) = watch::channel(0);

        let hub = Self {
            commands: commands_tx,
            active: active_rx,
            next_id: Arc::new(AtomicU64::new(1)),
            queue_capacity: config.queue_capacity.max(1),
        };

        let hub_loop = HubLoop {
            subscribers: HashMap::new(),
            commands: commands_rx,
            active: active_tx,
            stats: HubStats::new(),
        };

        (hub, hub_loop)
    }

    /// Create a hub and spawn its loop on the current runtime
    pub fn spawn(config: HubConfig) -> Self {
        let (hub, hub_loop) = Self::new(config);
        tokio::spawn(hub_loop.run());
        hub
    }

    /// Register a new subscriber
    ///
    /// Returns once the hub loop has added it, so every later broadcast
    /// reaches it. If the loop has stopped, the returned subscription's queue
    /// is already closed.
    pub async fn register(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (entry, subscription) = subscriber::pair(id, self.queue_capacity);
        let (ack_tx, ack_rx) = oneshot::channel();

        let command = HubCommand::Register {
            id,
            entry,
            ack: ack_tx,
        };

        if self.commands.send(command).await.is_ok() {
            let _ = ack_rx.await;
        } else {
            tracing::warn!(subscriber_id = id, "Hub stopped, subscriber not registered");
        }

        subscription
    }

    /// Unregister a subscriber, closing its queue
    ///
    /// Unregistering an absent subscriber is a no-op.
    pub async fn unregister(&self, id: SubscriberId) {
        let (ack_tx, ack_rx) = oneshot::channel();

        if self
            .commands
            .send(HubCommand::Unregister { id, ack: ack_tx })
            .await
            .is_ok()
        {
            let _ = ack_rx.await;
        }
    }

    /// Broadcast an event to every registered subscriber
    ///
    /// Waits only for room in the hub's mailbox, never for subscribers.
    pub async fn broadcast(&self, event: PositionEvent) {
        if self
            .commands
            .send(HubCommand::Broadcast(event))
            .await
            .is_err()
        {
            tracing::debug!("Hub stopped, event dropped");
        }
    }

    /// Number of registered subscribers, as of the hub loop's last change
    pub fn active_count(&self) -> usize {
        *self.active.borrow()
    }

    /// Snapshot of hub statistics
    pub async fn stats(&self) -> HubStats {
        let (reply_tx, reply_rx) = oneshot::channel();

        if self
            .commands
            .send(HubCommand::Stats { reply: reply_tx })
            .await
            .is_err()
        {
            return HubStats::default();
        }

        reply_rx.await.unwrap_or_default()
    }
}

/// The hub's coordination loop, sole owner of the registry
pub struct HubLoop {
    subscribers: HashMap<SubscriberId, SubscriberEntry>,
    commands: mpsc::Receiver<HubCommand>,
    active: watch::Sender<usize>,
    stats: HubStats,
}

impl HubLoop {
    /// Serve commands until every [`Hub`] handle is dropped
    pub async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { id, entry, ack } => {
                    self.register(id, entry);
                    let _ = ack.send(());
                }
                HubCommand::Unregister { id, ack } => {
                    self.unregister(id);
                    let _ = ack.send(());
                }
                HubCommand::Broadcast(event) => self.broadcast(event),
                HubCommand::Stats { reply } => {
                    let _ = reply.send(self.snapshot());
                }
            }
        }

        tracing::debug!(subscribers = self.subscribers.len(), "Hub stopped");
    }

    fn register(&mut self, id: SubscriberId, entry: SubscriberEntry) {
        self.subscribers.insert(id, entry);
        self.stats.total_registered += 1;
        self.publish_count();

        tracing::info!(
            subscriber_id = id,
            subscribers = self.subscribers.len(),
            "Subscriber connected"
        );
    }

    fn unregister(&mut self, id: SubscriberId) {
        // Dropping the entry drops the only sender, closing the queue
        if self.subscribers.remove(&id).is_some() {
            self.stats.unregistered += 1;
            self.publish_count();

            tracing::info!(
                subscriber_id = id,
                subscribers = self.subscribers.len(),
                "Subscriber disconnected"
            );
        }
    }

    fn broadcast(&mut self, event: PositionEvent) {
        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, vessel = %event.name, "Failed to serialize event");
                return;
            }
        };

        self.stats.events_broadcast += 1;
        let before = self.subscribers.len();
        let stats = &mut self.stats;

        self.subscribers
            .retain(|id, entry| match entry.tx.try_send(frame.clone()) {
                Ok(()) => {
                    stats.frames_enqueued += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    stats.evicted += 1;
                    tracing::warn!(subscriber_id = *id, "Subscriber queue full, evicting");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    stats.unregistered += 1;
                    tracing::debug!(subscriber_id = *id, "Subscriber queue gone, removing");
                    false
                }
            });

        if self.subscribers.len() != before {
            self.publish_count();
            tracing::info!(
                removed = before - self.subscribers.len(),
                subscribers = self.subscribers.len(),
                "Subscribers removed during broadcast"
            );
        }

        tracing::trace!(
            vessel = %event.name,
            subscribers = self.subscribers.len(),
            "Event broadcast"
        );
    }

    fn publish_count(&self) {
        self.active.send_replace(self.subscribers.len());
    }

    fn snapshot(&self) -> HubStats {
        HubStats {
            active_subscribers: self.subscribers.len() as u64,
            ..self.stats.clone()
        }
    }
}
