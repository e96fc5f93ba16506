use crate::message::{AlertRecord, Beacon, BeaconSnapshot, BuildingLayout, FirefighterTelemetry};
use crate::state::deriver::FirefighterConditions;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Read-only view of the live store handed to consumers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LiveSnapshot {
    pub firefighters: BTreeMap<String, FirefighterTelemetry>,
    pub beacons: Option<BeaconSnapshot>,
    pub building: Option<BuildingLayout>,
    /// Most recent first
    pub alerts: Vec<AlertRecord>,
    pub connected: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub conditions: BTreeMap<String, FirefighterConditions>,
}

impl LiveSnapshot {
    pub fn firefighter(&self, firefighter_id: &str) -> Option<&FirefighterTelemetry> {
        self.firefighters.get(firefighter_id)
    }

    pub fn firefighter_list(&self) -> Vec<&FirefighterTelemetry> {
        self.firefighters.values().collect()
    }

    pub fn beacons(&self) -> &[Beacon] {
        self.beacons
            .as_ref()
            .map(|b| b.beacons.as_slice())
            .unwrap_or(&[])
    }

    pub fn alert(&self, alert_id: &str) -> Option<&AlertRecord> {
        self.alerts.iter().find(|a| a.id == alert_id)
    }

    /// Alerts that are neither resolved nor acknowledged
    pub fn pending_alerts(&self) -> impl Iterator<Item = &AlertRecord> {
        self.alerts.iter().filter(|a| !a.resolved && !a.acknowledged)
    }

    /// Firefighters currently on the given floor
    pub fn firefighters_on_floor(&self, floor: i32) -> impl Iterator<Item = &FirefighterTelemetry> {
        self.firefighters
            .values()
            .filter(move |t| t.position.floor == floor)
    }
}

/// Change notification broadcast after each store transaction
#[derive(Clone, Debug, PartialEq)]
pub enum StoreChange {
    TelemetryUpdated { firefighter_id: String, sequence: u64 },
    AlertRaised(AlertRecord),
    AlertUpdated(AlertRecord),
    AlertEvicted { alert_id: String },
    AlertAcknowledged { alert_id: String },
    BeaconsReplaced { count: usize },
    LayoutReplaced { building_id: String },
    ConnectivityChanged { connected: bool },
}
