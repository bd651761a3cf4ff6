//! Downstream WebSocket server
//!
//! ```text
//!   GET /ws ──► Origin check ──► connection limit ──► upgrade ──► Session
//!                   │                  │
//!                   ▼                  ▼
//!                  403                503
//! ```

pub mod config;
pub mod listener;

pub use config::ServerConfig;
pub use listener::RelayServer;
