//! Upstream AIS feed
//!
//! Connects to aisstream.io only while someone is listening:
//!
//! ```text
//!   hub.active_count() > 0 ──► connect ──► send SubscriptionMessage
//!                                              │
//!          ┌───────────────────────────────────┘
//!          ▼
//!   read ──► StreamMessage::decode ──► into_position ──► hub.broadcast
//!     ▲                                                      │
//!     └───────────────── while active_count() > 0 ───────────┘
//! ```
//!
//! The transport sits behind [`FeedConnector`]/[`Feed`], so the supervisor
//! can be driven by any connection that yields raw JSON messages.

pub mod config;
pub mod connector;
pub mod message;
pub mod state;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod mock;

pub use config::{BoundingBox, UpstreamConfig, DEFAULT_STREAM_URL, WORLD};
pub use connector::{Feed, FeedConnector, WsConnector, WsFeed};
pub use message::{MessageType, StreamMessage, SubscriptionMessage};
pub use state::{CloseReason, UpstreamState};
pub use supervisor::{UpstreamMonitor, UpstreamSupervisor};
