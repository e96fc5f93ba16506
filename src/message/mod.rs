use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

mod command;
mod types;

pub use command::OutboundCommand;
pub use types::{
    AlertCategory, AlertKind, AlertOrigin, AlertRecord, Beacon, BeaconSnapshot, BeaconStatus,
    BuildingConfig, BuildingLayout, DetectedTag, Device, Dimensions, EntryPoint, Environment,
    Firefighter, FirefighterTelemetry, Floor, HazardZone, Point2, Point3, Position, Scba,
    ScbaAlarms, Severity, Vitals,
};

/// Discriminant values of the inbound stream.
pub const KIND_TELEMETRY: &str = "tag_telemetry";
pub const KIND_BEACONS: &str = "beacons_status";
pub const KIND_LAYOUT: &str = "building_config";
pub const KIND_ALERT: &str = "alert";

/// One decoded inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    Telemetry(Box<FirefighterTelemetry>),
    Beacons(BeaconSnapshot),
    Layout(BuildingConfig),
    Alert(AlertRecord),
}

impl InboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Telemetry(_) => KIND_TELEMETRY,
            InboundMessage::Beacons(_) => KIND_BEACONS,
            InboundMessage::Layout(_) => KIND_LAYOUT,
            InboundMessage::Alert(_) => KIND_ALERT,
        }
    }
}

/// Result of a successful decode.
///
/// Frames with a discriminant this client does not know come back as
/// `Unknown` so newer backends cannot break older clients.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    Message(InboundMessage),
    Unknown(Option<String>),
}

/// Decode errors for inbound frames
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    InvalidJson(String),
    NotObject,
    InvalidMessage { kind: &'static str, reason: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidJson(reason) => write!(f, "frame is not valid JSON: {}", reason),
            DecodeError::NotObject => write!(f, "frame must be a JSON object"),
            DecodeError::InvalidMessage { kind, reason } => {
                write!(f, "invalid '{}' message: {}", kind, reason)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decodes one raw text frame.
///
/// The frame is parsed fully before anything is returned, so a failure never
/// yields a partially built message.
pub fn decode_frame(text: &str) -> Result<Decoded, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    let kind = match &value {
        Value::Object(map) => map.get("type").and_then(|v| v.as_str()).map(str::to_owned),
        _ => return Err(DecodeError::NotObject),
    };

    let message = match kind.as_deref() {
        Some(KIND_TELEMETRY) => {
            InboundMessage::Telemetry(Box::new(parse_as(KIND_TELEMETRY, value)?))
        }
        Some(KIND_BEACONS) => InboundMessage::Beacons(parse_as(KIND_BEACONS, value)?),
        Some(KIND_LAYOUT) => InboundMessage::Layout(parse_as(KIND_LAYOUT, value)?),
        Some(KIND_ALERT) => InboundMessage::Alert(parse_as(KIND_ALERT, value)?),
        _ => return Ok(Decoded::Unknown(kind)),
    };

    Ok(Decoded::Message(message))
}

fn parse_as<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::InvalidMessage {
        kind,
        reason: e.to_string(),
    })
}
