//! Upstream feed configuration

use std::time::Duration;

/// Default aisstream.io endpoint
pub const DEFAULT_STREAM_URL: &str = "wss://stream.aisstream.io/v0/stream";

/// A bounding box as two `[latitude, longitude]` corners
pub type BoundingBox = [[f64; 2]; 2];

/// The whole globe
pub const WORLD: BoundingBox = [[-90.0, -180.0], [90.0, 180.0]];

/// Upstream feed configuration
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// WebSocket URL of the feed
    pub url: String,

    /// API key sent in the subscription message
    pub api_key: String,

    /// Areas to receive position reports for
    pub bounding_boxes: Vec<BoundingBox>,

    /// How often to check for subscribers while disconnected
    pub idle_poll_interval: Duration,

    /// Wait after a failed connect or subscribe before trying again
    pub connect_backoff: Duration,

    /// Wait after a connection ends before re-evaluating demand
    pub reconnect_delay: Duration,

    /// Longest a single read may wait before demand is re-checked
    pub read_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            api_key: String::new(),
            bounding_boxes: vec![WORLD],
            idle_poll_interval: Duration::from_secs(1),
            connect_backoff: Duration::from_secs(5),
            reconnect_delay: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
        }
    }
}

impl UpstreamConfig {
    /// Create a config for the default feed with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the feed URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the idle poll interval
    pub fn idle_poll_interval(mut self, interval: Duration) -> Self {
        self.idle_poll_interval = interval;
        self
    }

    /// Set the connect backoff
    pub fn connect_backoff(mut self, backoff: Duration) -> Self {
        self.connect_backoff = backoff;
        self
    }

    /// Set the reconnect delay
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}
