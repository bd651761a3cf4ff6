//! # ais-relay
//!
//! Relays live AIS vessel positions from aisstream.io to WebSocket
//! subscribers, holding the upstream connection open only while at least one
//! subscriber is connected.
//!
//! ```text
//!   aisstream.io ──► UpstreamSupervisor ──► Hub ──► Session ──► browser
//!                          ▲                 │  ──► Session ──► browser
//!                          └─ active_count ──┘  ──► Session ──► browser
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ais_relay::config::RelayConfig;
//! use ais_relay::hub::Hub;
//! use ais_relay::server::RelayServer;
//! use ais_relay::upstream::{UpstreamSupervisor, WsConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::from_env()?;
//!
//!     let hub = Hub::spawn(config.hub);
//!     UpstreamSupervisor::new(hub.clone(), WsConnector, config.upstream).spawn();
//!
//!     RelayServer::new(config.server, hub).run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod hub;
pub mod server;
pub mod session;
pub mod stats;
pub mod upstream;

pub use config::RelayConfig;
pub use error::{ConfigError, Error, Result};
pub use hub::{Hub, HubConfig, PositionEvent};
pub use server::{RelayServer, ServerConfig};
pub use upstream::{UpstreamConfig, UpstreamSupervisor};
