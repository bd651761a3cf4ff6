//! Server configuration

use std::net::SocketAddr;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Default WebSocket route
pub const DEFAULT_PATH: &str = "/ws";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Route accepting WebSocket upgrades
    pub path: String,

    /// Exact `Origin` header value a client must present
    pub allowed_origin: String,

    /// Maximum concurrent subscribers (0 = unlimited)
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            path: DEFAULT_PATH.to_string(),
            allowed_origin: String::new(),
            max_connections: 0, // Unlimited
        }
    }
}

impl ServerConfig {
    /// Create a config accepting clients from `origin`
    pub fn new(allowed_origin: impl Into<String>) -> Self {
        Self {
            allowed_origin: allowed_origin.into(),
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Listen on all interfaces at `port`
    pub fn port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Set the WebSocket route
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }
}
