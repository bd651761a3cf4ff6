//! Upstream connection state machine
//!
//! ```text
//!   Disconnected ──(subscribers > 0)──► Connecting ──(subscribed)──► Subscribed
//!        ▲                                  │                            │
//!        └──────(connect/send failed)───────┘                            │
//!        └──────────(no subscribers, read error, stream end)─────────────┘
//! ```

/// Lifecycle state of the upstream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamState {
    /// No connection open; waiting for demand or backing off
    Disconnected,
    /// Connecting and sending the subscription message
    Connecting,
    /// Subscribed and relaying position reports
    Subscribed,
}

impl UpstreamState {
    /// Whether an upstream connection is open (or being opened)
    pub fn is_open(&self) -> bool {
        !matches!(self, UpstreamState::Disconnected)
    }
}

impl std::fmt::Display for UpstreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UpstreamState::Disconnected => "disconnected",
            UpstreamState::Connecting => "connecting",
            UpstreamState::Subscribed => "subscribed",
        };
        f.write_str(name)
    }
}

/// Why a subscribed connection was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The last subscriber left
    NoSubscribers,
    /// Reading from the feed failed
    ReadError,
    /// The feed ended the stream
    StreamEnded,
}
