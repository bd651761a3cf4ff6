//! Demand-gated upstream supervisor
//!
//! Keeps at most one connection to the feed open, and only while the hub has
//! subscribers. Failures never escape: connect and subscribe failures back
//! off and retry, read failures drop the connection and re-evaluate demand,
//! undecodable messages are skipped.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::config::UpstreamConfig;
use super::connector::{Feed, FeedConnector};
use super::message::{StreamMessage, SubscriptionMessage};
use super::state::{CloseReason, UpstreamState};
use crate::error::Error;
use crate::hub::Hub;
use crate::stats::{UpstreamCounters, UpstreamStats};

/// Read-only view of a running supervisor
#[derive(Clone)]
pub struct UpstreamMonitor {
    state: watch::Receiver<UpstreamState>,
    counters: Arc<UpstreamCounters>,
}

impl UpstreamMonitor {
    /// Current connection state
    pub fn state(&self) -> UpstreamState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change
    pub fn watch_state(&self) -> watch::Receiver<UpstreamState> {
        self.state.clone()
    }

    /// Snapshot of feed statistics
    pub fn stats(&self) -> UpstreamStats {
        self.counters.snapshot()
    }
}

/// Owns the upstream connection and feeds the hub
pub struct UpstreamSupervisor<C: FeedConnector> {
    hub: Hub,
    connector: C,
    config: UpstreamConfig,
    state: watch::Sender<UpstreamState>,
    counters: Arc<UpstreamCounters>,
}

impl<C: FeedConnector> UpstreamSupervisor<C> {
    /// Create a supervisor; nothing happens until it is run
    pub fn new(hub: Hub, connector: C, config: UpstreamConfig) -> Self {
        let (state, _) = watch::channel(UpstreamState::Disconnected);

        Self {
            hub,
            connector,
            config,
            state,
            counters: Arc::new(UpstreamCounters::new()),
        }
    }

    /// A handle for observing the supervisor after it has been spawned
    pub fn monitor(&self) -> UpstreamMonitor {
        UpstreamMonitor {
            state: self.state.subscribe(),
            counters: Arc::clone(&self.counters),
        }
    }

    /// Spawn the supervisor loop
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the supervisor loop; never returns
    pub async fn run(self) {
        loop {
            self.wait_for_demand().await;

            let Some(mut feed) = self.open().await else {
                tokio::time::sleep(self.config.connect_backoff).await;
                continue;
            };

            let reason = self.relay(&mut feed).await;
            feed.close().await;
            self.set_state(UpstreamState::Disconnected);

            tracing::info!(
                reason = ?reason,
                subscribers = self.hub.active_count(),
                "Disconnected from upstream feed"
            );

            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    async fn wait_for_demand(&self) {
        while self.hub.active_count() == 0 {
            tokio::time::sleep(self.config.idle_poll_interval).await;
        }
    }

    /// Connect and subscribe, or `None` after logging the failure
    async fn open(&self) -> Option<C::Feed> {
        self.set_state(UpstreamState::Connecting);
        self.counters.connect_attempt();

        let mut feed = match self.connector.connect(&self.config.url).await {
            Ok(feed) => feed,
            Err(e) => {
                self.connect_failed("connect", &e);
                return None;
            }
        };

        let subscription =
            SubscriptionMessage::position_reports(&self.config.api_key, &self.config.bounding_boxes);
        let sent = match subscription.to_json() {
            Ok(json) => feed.send_text(json).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = sent {
            feed.close().await;
            self.connect_failed("subscribe", &e);
            return None;
        }

        self.set_state(UpstreamState::Subscribed);
        tracing::info!(
            url = %self.config.url,
            subscribers = self.hub.active_count(),
            "Connected to upstream feed"
        );

        Some(feed)
    }

    fn connect_failed(&self, stage: &'static str, error: &Error) {
        self.counters.connect_failure();
        self.set_state(UpstreamState::Disconnected);

        tracing::warn!(
            stage = stage,
            error = %error,
            retry_in = ?self.config.connect_backoff,
            "Upstream connection failed"
        );
    }

    /// Relay messages until demand is gone or the connection fails
    async fn relay(&self, feed: &mut C::Feed) -> CloseReason {
        loop {
            if self.hub.active_count() == 0 {
                return CloseReason::NoSubscribers;
            }

            let read = tokio::time::timeout(self.config.read_timeout, feed.next_message()).await;
            let raw = match read {
                // Quiet feed; go round and re-check demand
                Err(_) => continue,
                Ok(None) => return CloseReason::StreamEnded,
                Ok(Some(Err(e))) => {
                    tracing::warn!(error = %e, "Upstream read error");
                    return CloseReason::ReadError;
                }
                Ok(Some(Ok(raw))) => raw,
            };

            self.counters.message_received();
            self.forward(&raw).await;
        }
    }

    async fn forward(&self, raw: &[u8]) {
        let message = match StreamMessage::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                self.counters.decode_error();
                tracing::warn!(error = %e, "Failed to decode upstream message");
                return;
            }
        };

        let message_type = message.message_type;
        let mmsi = message.metadata.mmsi;
        match message.into_position() {
            Some(event) => {
                self.counters.event_forwarded();
                tracing::trace!(mmsi = ?mmsi, vessel = %event.name, "Forwarding position");
                self.hub.broadcast(event).await;
            }
            None => {
                tracing::trace!(message_type = ?message_type, mmsi = ?mmsi, "Ignoring upstream message");
            }
        }
    }

    fn set_state(&self, state: UpstreamState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "Upstream state changed");
        }
    }
}
