//! aisstream.io wire messages
//!
//! Outgoing: one [`SubscriptionMessage`] right after connecting.
//! Incoming: [`StreamMessage`] envelopes, tagged by `MessageType`:
//!
//! ```text
//! {"MessageType":"PositionReport",
//!  "MetaData":{"MMSI":...,"ShipName":"...",...},
//!  "Message":{"PositionReport":{"Latitude":...,"Longitude":...,...}}}
//! ```

use serde::{Deserialize, Serialize};

use super::config::BoundingBox;
use crate::hub::PositionEvent;

/// Kind of AIS message carried by an envelope
///
/// Only position reports are relayed; every other tag decodes as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    PositionReport,
    #[serde(other)]
    Other,
}

/// Control message sent once after connecting
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionMessage<'a> {
    #[serde(rename = "APIKey")]
    pub api_key: &'a str,
    #[serde(rename = "BoundingBoxes")]
    pub bounding_boxes: &'a [BoundingBox],
    #[serde(rename = "FilterMessageTypes")]
    pub filter_message_types: &'a [MessageType],
}

impl<'a> SubscriptionMessage<'a> {
    /// Subscribe to position reports inside the given areas
    pub fn position_reports(api_key: &'a str, bounding_boxes: &'a [BoundingBox]) -> Self {
        Self {
            api_key,
            bounding_boxes,
            filter_message_types: &[MessageType::PositionReport],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Envelope of every incoming feed message
#[derive(Debug, Clone, Deserialize)]
pub struct StreamMessage {
    #[serde(rename = "MessageType")]
    pub message_type: MessageType,
    #[serde(rename = "MetaData", default)]
    pub metadata: MetaData,
    #[serde(rename = "Message", default)]
    pub message: MessageBody,
}

/// Envelope metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaData {
    #[serde(rename = "MMSI")]
    pub mmsi: Option<u64>,
    #[serde(rename = "ShipName")]
    pub ship_name: Option<String>,
}

/// Envelope payload, keyed by message type
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageBody {
    #[serde(rename = "PositionReport")]
    pub position_report: Option<PositionReport>,
}

/// Position report payload
#[derive(Debug, Clone, Deserialize)]
pub struct PositionReport {
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

impl StreamMessage {
    /// Decode one raw feed message
    pub fn decode(raw: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(raw)
    }

    /// Convert to a position event
    ///
    /// `None` for other message types and for position reports without a
    /// vessel name or payload.
    pub fn into_position(self) -> Option<PositionEvent> {
        match self.message_type {
            MessageType::PositionReport => {
                let name = self.metadata.ship_name?;
                let report = self.message.position_report?;
                Some(PositionEvent::new(name, report.latitude, report.longitude))
            }
            MessageType::Other => None,
        }
    }
}
