//! Downstream subscriber sessions
//!
//! A session bridges one downstream connection to the hub with two pumps,
//! each running as its own task:
//!
//! ```text
//!   hub ──► Subscription ──► outbound pump ──► FrameSink ──► peer
//!                                                           │
//!   hub ◄── unregister ◄──── inbound pump ◄── FrameSource ◄─┘
//! ```
//!
//! The outbound pump ends when its queue is closed (unregistration or a
//! backpressure eviction) or a write fails; the inbound pump ends when the
//! peer closes or a read fails. Either way the subscriber is unregistered
//! and the connection closed.

pub mod pumps;
pub mod transport;

pub use pumps::Session;
pub use transport::{FrameSink, FrameSource};
