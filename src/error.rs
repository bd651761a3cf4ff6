//! Error types
//!
//! Errors only cross the seams to external collaborators (upstream client,
//! downstream transport, process configuration). The hub, the supervisor and
//! the session pumps contain them locally and log.

use std::fmt;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Crate error type
#[derive(Debug)]
pub enum Error {
    /// Socket-level I/O failure
    Io(std::io::Error),
    /// Upstream WebSocket failure
    Upstream(tokio_tungstenite::tungstenite::Error),
    /// Downstream WebSocket failure
    Downstream(axum::Error),
    /// JSON encode/decode failure
    Json(serde_json::Error),
    /// Invalid or missing startup configuration
    Config(ConfigError),
}

/// Configuration errors, fatal at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set
    Missing {
        key: &'static str,
        hint: &'static str,
    },
    /// An environment variable could not be parsed
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Upstream(e) => write!(f, "Upstream error: {}", e),
            Error::Downstream(e) => write!(f, "Downstream error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Upstream(e) => Some(e),
            Error::Downstream(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Config(e) => Some(e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { key, hint } => {
                write!(f, "Please set {} environment variable{}", key, hint)
            }
            ConfigError::Invalid { key, value } => {
                write!(f, "Invalid {} value: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::Upstream(e)
    }
}

impl From<axum::Error> for Error {
    fn from(e: axum::Error) -> Self {
        Error::Downstream(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}
