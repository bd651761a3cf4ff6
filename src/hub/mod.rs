//! Subscriber hub for position fan-out
//!
//! The hub owns the set of live subscribers and delivers every broadcast
//! event to each of them. It is an actor: one task owns the registry and
//! serves register/unregister/broadcast requests from a bounded mailbox.
//!
//! # Architecture
//!
//! ```text
//!                            hub loop (one task)
//!                     ┌──────────────────────────────┐
//!   Hub::register ───►│ subscribers: HashMap<Id,     │
//!   Hub::unregister ─►│   mpsc::Sender<Frame>>       │──► watch<usize> (active_count)
//!   Hub::broadcast ──►│                              │
//!                     └──────────────┬───────────────┘
//!                                    │ try_send
//!         ┌──────────────────────────┼──────────────────────────┐
//!         ▼                          ▼                          ▼
//!   [Subscription]             [Subscription]             [Subscription]
//!   outbound pump              outbound pump              outbound pump
//! ```
//!
//! # Backpressure
//!
//! Each subscriber has a bounded queue. Broadcast never waits on it: when the
//! queue is full the subscriber is evicted on the spot, its queue closed and
//! its entry removed, so one slow consumer can neither stall the others nor
//! grow memory without bound.

pub mod config;
pub mod event;
pub mod store;
pub mod subscriber;

pub use config::HubConfig;
pub use event::{Frame, PositionEvent};
pub use store::{Hub, HubLoop};
pub use subscriber::{SubscriberId, Subscription};
