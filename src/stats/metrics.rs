//! Statistics for the hub and the upstream feed

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Hub-wide statistics, maintained by the hub loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Subscribers currently registered
    pub active_subscribers: u64,
    /// Subscribers ever registered
    pub total_registered: u64,
    /// Subscribers removed by unregistration
    pub unregistered: u64,
    /// Subscribers removed because their queue was full
    pub evicted: u64,
    /// Events broadcast
    pub events_broadcast: u64,
    /// Frames successfully enqueued across all subscribers
    pub frames_enqueued: u64,
}

impl HubStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Average number of subscribers reached per broadcast
    pub fn fanout(&self) -> f64 {
        if self.events_broadcast > 0 {
            self.frames_enqueued as f64 / self.events_broadcast as f64
        } else {
            0.0
        }
    }
}

/// Upstream feed counters, shared between the supervisor and observers
#[derive(Debug)]
pub(crate) struct UpstreamCounters {
    started_at: Instant,
    connect_attempts: AtomicU64,
    connect_failures: AtomicU64,
    messages_received: AtomicU64,
    decode_errors: AtomicU64,
    events_forwarded: AtomicU64,
}

impl UpstreamCounters {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Instant::now(),
            connect_attempts: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            events_forwarded: AtomicU64::new(0),
        }
    }

    pub(crate) fn connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn event_forwarded(&self) {
        self.events_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> UpstreamStats {
        UpstreamStats {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            events_forwarded: self.events_forwarded.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

/// Snapshot of upstream feed statistics
#[derive(Debug, Clone, Default)]
pub struct UpstreamStats {
    /// Connection attempts, successful or not
    pub connect_attempts: u64,
    /// Attempts that failed to connect or to subscribe
    pub connect_failures: u64,
    /// Messages read from the feed
    pub messages_received: u64,
    /// Messages that could not be decoded
    pub decode_errors: u64,
    /// Position events handed to the hub
    pub events_forwarded: u64,
    /// Time since the supervisor was created
    pub uptime: Duration,
}

impl UpstreamStats {
    /// Messages read but not forwarded (undecodable, other types, incomplete)
    pub fn skipped(&self) -> u64 {
        self.messages_received.saturating_sub(self.events_forwarded)
    }

    /// Forwarded events per second since startup
    pub fn event_rate(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.events_forwarded as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_stats_new() {
        let stats = HubStats::new();
        assert_eq!(stats.active_subscribers, 0);
        assert_eq!(stats.evicted, 0);
        assert_eq!(stats.fanout(), 0.0);
    }

    #[test]
    fn test_hub_stats_fanout() {
        let stats = HubStats {
            events_broadcast: 4,
            frames_enqueued: 10,
            ..HubStats::default()
        };

        assert_eq!(stats.fanout(), 2.5);
    }

    #[test]
    fn test_upstream_counters_snapshot() {
        let counters = UpstreamCounters::new();
        counters.connect_attempt();
        counters.connect_attempt();
        counters.connect_failure();
        for _ in 0..5 {
            counters.message_received();
        }
        counters.decode_error();
        counters.event_forwarded();
        counters.event_forwarded();

        let stats = counters.snapshot();
        assert_eq!(stats.connect_attempts, 2);
        assert_eq!(stats.connect_failures, 1);
        assert_eq!(stats.messages_received, 5);
        assert_eq!(stats.decode_errors, 1);
        assert_eq!(stats.events_forwarded, 2);
        assert_eq!(stats.skipped(), 3);
    }

    #[test]
    fn test_upstream_event_rate_zero_uptime() {
        let stats = UpstreamStats::default();
        assert_eq!(stats.event_rate(), 0.0);
    }
}
