//! Process configuration
//!
//! Everything is read from the environment once at startup:
//!
//! | Variable         | Required | Default                               |
//! |------------------|----------|---------------------------------------|
//! | `AIS_API_KEY`    | yes      |                                       |
//! | `ORIGIN`         | yes      |                                       |
//! | `PORT`           | no       | `8080`                                |
//! | `AIS_STREAM_URL` | no       | `wss://stream.aisstream.io/v0/stream` |

use std::time::Duration;

use crate::error::ConfigError;
use crate::hub::HubConfig;
use crate::server::config::DEFAULT_PORT;
use crate::server::ServerConfig;
use crate::upstream::UpstreamConfig;

/// Default interval between statistics log lines
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(60);

/// Full relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub hub: HubConfig,

    /// How often hub and upstream statistics are logged
    pub stats_interval: Duration,
}

impl RelayConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let api_key = get("AIS_API_KEY").ok_or(ConfigError::Missing {
            key: "AIS_API_KEY",
            hint: "",
        })?;

        let origin = get("ORIGIN").ok_or(ConfigError::Missing {
            key: "ORIGIN",
            hint: " (e.g., http://localhost:3000)",
        })?;

        let port = match get("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value })?,
            None => DEFAULT_PORT,
        };

        let mut upstream = UpstreamConfig::new(api_key);
        if let Some(url) = get("AIS_STREAM_URL") {
            upstream = upstream.url(url);
        }

        Ok(Self {
            server: ServerConfig::new(origin).port(port),
            upstream,
            hub: HubConfig::default(),
            stats_interval: DEFAULT_STATS_INTERVAL,
        })
    }
}
