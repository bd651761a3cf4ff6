//! Hub configuration

/// Default per-subscriber outbound queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default capacity of the hub's command mailbox
pub const DEFAULT_MAILBOX_CAPACITY: usize = 100;

/// Configuration for the subscriber hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Outbound queue capacity per subscriber.
    ///
    /// A subscriber whose queue is full when an event is broadcast is evicted.
    pub queue_capacity: usize,

    /// Pending commands (register/unregister/broadcast) before callers wait
    pub mailbox_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

impl HubConfig {
    /// Set the per-subscriber queue capacity (minimum 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the mailbox capacity (minimum 1)
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();

        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.mailbox_capacity, 100);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        // tokio mpsc channels panic on zero capacity
        let config = HubConfig::default().queue_capacity(0).mailbox_capacity(0);

        assert_eq!(config.queue_capacity, 1);
        assert_eq!(config.mailbox_capacity, 1);
    }
}
