//! Position events and the frames broadcast to subscribers

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One vessel position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEvent {
    /// Vessel name as reported by the feed
    pub name: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl PositionEvent {
    /// Create a new position event
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Serialize to the JSON text frame delivered downstream
    pub fn to_frame(&self) -> serde_json::Result<Frame> {
        serde_json::to_vec(self).map(|json| Frame(Bytes::from(json)))
    }
}

/// A serialized event, queued for delivery
///
/// Cheap to clone: every subscriber shares the same reference-counted buffer.
/// Always holds valid UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Bytes);

impl Frame {
    /// Frame contents as text
    pub fn as_str(&self) -> &str {
        // Only constructed from serde_json output
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Raw bytes of the frame
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
