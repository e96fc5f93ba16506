use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Firefighter identity as carried by telemetry and alerts.
///
/// `id` is stable for the person; the wearable's `tag_id` lives on the
/// enclosing message and may change when a device is swapped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Firefighter {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub team: String,
}

/// Fused indoor position estimate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    pub floor: i32,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub beacons_used: u32,
    #[serde(default)]
    pub accuracy_m: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    #[serde(default)]
    pub heart_rate_bpm: f64,
    #[serde(default)]
    pub hr_zone: String,
    #[serde(default)]
    pub motion_state: String,
    #[serde(default)]
    pub stress_level: String,
    #[serde(default)]
    pub skin_temperature_c: f64,
    #[serde(default)]
    pub step_count: u64,
    /// Seconds since the last detected movement. Drives the man-down check.
    #[serde(default)]
    pub stationary_duration_s: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScbaAlarms {
    #[serde(default)]
    pub low_pressure: bool,
    #[serde(default)]
    pub very_low_pressure: bool,
    #[serde(default)]
    pub motion: bool,
}

/// Breathing apparatus readings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scba {
    #[serde(default)]
    pub cylinder_pressure_bar: f64,
    #[serde(default)]
    pub max_pressure_bar: f64,
    #[serde(default)]
    pub consumption_rate_lpm: f64,
    #[serde(default)]
    pub remaining_time_min: f64,
    #[serde(default)]
    pub alarms: ScbaAlarms,
    #[serde(default)]
    pub battery_percent: f64,
    #[serde(default)]
    pub connection_status: String,
}

/// Gas and temperature readings with their alarm flags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub co_ppm: f64,
    #[serde(default)]
    pub co_alarm: bool,
    #[serde(default)]
    pub co2_ppm: f64,
    #[serde(default)]
    pub co2_alarm: bool,
    #[serde(default)]
    pub o2_percent: f64,
    #[serde(default)]
    pub o2_alarm: bool,
    #[serde(default)]
    pub lel_percent: f64,
    #[serde(default)]
    pub lel_alarm: bool,
    #[serde(default)]
    pub temperature_c: f64,
    #[serde(default)]
    pub temperature_alarm: bool,
    #[serde(default)]
    pub humidity_percent: f64,
    #[serde(default)]
    pub sensor_status: String,
}

impl Environment {
    /// True when any gas or temperature alarm flag is raised.
    pub fn any_alarm(&self) -> bool {
        self.co_alarm || self.co2_alarm || self.o2_alarm || self.lel_alarm || self.temperature_alarm
    }
}

/// Wearable tag health.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub battery_percent: f64,
    #[serde(default)]
    pub battery_charging: bool,
    #[serde(default)]
    pub connection_primary: String,
    #[serde(default)]
    pub connection_backup: String,
    #[serde(default)]
    pub lora_rssi_dbm: f64,
    #[serde(default)]
    pub lte_rssi_dbm: f64,
    #[serde(default)]
    pub uptime_s: u64,
    /// Latched by the tag until the button is reset on the device.
    #[serde(default)]
    pub sos_button_pressed: bool,
}

/// One `tag_telemetry` frame. Replaces the previous value for the same
/// firefighter wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirefighterTelemetry {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub tag_id: String,
    pub firefighter: Firefighter,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_deg: Option<f64>,
    pub vitals: Vitals,
    #[serde(default)]
    pub scba: Scba,
    #[serde(default)]
    pub environment: Environment,
    pub device: Device,
}

impl FirefighterTelemetry {
    pub fn firefighter_id(&self) -> &str {
        &self.firefighter.id
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

/// Beacon operational status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeaconStatus {
    /// Nominal.
    Active,
    /// Degraded.
    Inactive,
    /// Unreachable.
    Offline,
}

/// A tag currently ranged by a beacon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedTag {
    pub tag_id: String,
    #[serde(default)]
    pub firefighter_id: String,
    #[serde(default)]
    pub firefighter_name: String,
    #[serde(default)]
    pub range_m: f64,
    #[serde(default)]
    pub rssi_dbm: f64,
    #[serde(default)]
    pub signal_quality: String,
    #[serde(default)]
    pub los: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Beacon {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub position: Point3,
    pub floor: i32,
    #[serde(rename = "type", default)]
    pub beacon_type: String,
    pub status: BeaconStatus,
    #[serde(default)]
    pub battery_percent: f64,
    #[serde(default)]
    pub signal_quality: String,
    #[serde(default)]
    pub tags_in_range: Vec<String>,
    #[serde(default)]
    pub detected_tags: Vec<DetectedTag>,
}

/// Full beacon broadcast (`beacons_status`). Not a delta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeaconSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub beacons: Vec<Beacon>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width_m: f64,
    pub depth_m: f64,
    pub height_m: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub number: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub height_m: f64,
    #[serde(default)]
    pub hazard_level: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub position: Point2,
    pub floor: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardZone {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub floor: i32,
    #[serde(rename = "type", default)]
    pub zone_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingLayout {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "type", default)]
    pub building_type: String,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub floors: Vec<Floor>,
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
    #[serde(default)]
    pub hazard_zones: Vec<HazardZone>,
}

/// `building_config` frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingConfig {
    pub timestamp: DateTime<Utc>,
    pub building: BuildingLayout,
}

/// Wire-level alert type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ManDown,
    SosPressed,
    HighHeartRate,
    LowBattery,
    ScbaLowPressure,
    ScbaCritical,
    BeaconOffline,
    TagOffline,
    HighTemperature,
    HighCo,
    LowOxygen,
    ExplosiveGas,
}

/// Closed set of alert categories the dashboard groups by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    ManDown,
    EmergencyButton,
    VitalSign,
    Battery,
    Apparatus,
    ConnectivityLoss,
    Environmental,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::ManDown => "man_down",
            AlertKind::SosPressed => "sos_pressed",
            AlertKind::HighHeartRate => "high_heart_rate",
            AlertKind::LowBattery => "low_battery",
            AlertKind::ScbaLowPressure => "scba_low_pressure",
            AlertKind::ScbaCritical => "scba_critical",
            AlertKind::BeaconOffline => "beacon_offline",
            AlertKind::TagOffline => "tag_offline",
            AlertKind::HighTemperature => "high_temperature",
            AlertKind::HighCo => "high_co",
            AlertKind::LowOxygen => "low_oxygen",
            AlertKind::ExplosiveGas => "explosive_gas",
        }
    }

    pub fn category(&self) -> AlertCategory {
        match self {
            AlertKind::ManDown => AlertCategory::ManDown,
            AlertKind::SosPressed => AlertCategory::EmergencyButton,
            AlertKind::HighHeartRate => AlertCategory::VitalSign,
            AlertKind::LowBattery => AlertCategory::Battery,
            AlertKind::ScbaLowPressure | AlertKind::ScbaCritical => AlertCategory::Apparatus,
            AlertKind::BeaconOffline | AlertKind::TagOffline => AlertCategory::ConnectivityLoss,
            AlertKind::HighTemperature
            | AlertKind::HighCo
            | AlertKind::LowOxygen
            | AlertKind::ExplosiveGas => AlertCategory::Environmental,
        }
    }
}

impl AlertKind {
    /// Human-readable label for alert lists
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::ManDown => "Man Down",
            AlertKind::SosPressed => "SOS",
            AlertKind::HighHeartRate => "High heart rate",
            AlertKind::LowBattery => "Low battery",
            AlertKind::ScbaLowPressure => "Low SCBA pressure",
            AlertKind::ScbaCritical => "Critical SCBA",
            AlertKind::BeaconOffline => "Beacon offline",
            AlertKind::TagOffline => "Tag offline",
            AlertKind::HighTemperature => "High temperature",
            AlertKind::HighCo => "High CO",
            AlertKind::LowOxygen => "Low O2",
            AlertKind::ExplosiveGas => "Explosive gas",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// Where an alert came from. Never serialized; the backend only knows its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlertOrigin {
    #[default]
    Server,
    Local,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "alert_type")]
    pub kind: AlertKind,
    pub severity: Severity,
    #[serde(default)]
    pub tag_id: String,
    /// Absent for alerts about infrastructure, e.g. `beacon_offline`
    #[serde(default)]
    pub firefighter: Option<Firefighter>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub details: Value,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(skip)]
    pub origin: AlertOrigin,
}

impl AlertRecord {
    pub fn is_local(&self) -> bool {
        self.origin == AlertOrigin::Local
    }

    pub fn firefighter_id(&self) -> Option<&str> {
        self.firefighter.as_ref().map(|f| f.id.as_str())
    }
}
