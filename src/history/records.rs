use crate::message::{AlertKind, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Read an explicit `null` as the type's default. The backend stores blank
/// text columns and cleared links as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Firefighter as stored by the history backend (carries the tag id)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedFirefighter {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rank: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedPosition {
    #[serde(default)]
    pub id: Option<i64>,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: Option<f64>,
    pub floor: i32,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub beacons_used: Option<u32>,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedVitals {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub heart_rate_bpm: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub heart_rate_variability_ms: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub heart_rate_confidence: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hr_zone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub motion_state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stationary_duration_s: f64,
}

/// One row of `GET /telemetry/`.
///
/// `firefighter` and `position` are `None` once the linked row is deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub id: i64,
    #[serde(default)]
    pub firefighter: Option<RecordedFirefighter>,
    #[serde(default)]
    pub position: Option<RecordedPosition>,
    #[serde(default)]
    pub vitals: Option<RecordedVitals>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub record_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sequence: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_id: String,
    #[serde(default)]
    pub heading_deg: Option<f64>,
}

/// One row of `GET /alerts/`.
///
/// `alert_type` stays a plain string so rows with types this client does not
/// know still list; use [`AlertHistoryRecord::kind`] for the typed value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertHistoryRecord {
    pub id: String,
    #[serde(default)]
    pub firefighter: Option<RecordedFirefighter>,
    #[serde(default)]
    pub position: Option<RecordedPosition>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub record_type: String,
    pub timestamp: DateTime<Utc>,
    pub alert_type: String,
    pub severity: Severity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resolved: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub acknowledged: bool,
}

impl AlertHistoryRecord {
    pub fn kind(&self) -> Option<AlertKind> {
        serde_json::from_value(Value::String(self.alert_type.clone())).ok()
    }

    /// Display label, falling back to the raw type
    pub fn label(&self) -> String {
        match self.kind() {
            Some(kind) => kind.label().to_string(),
            None => self.alert_type.clone(),
        }
    }
}
