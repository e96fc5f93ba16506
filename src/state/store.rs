use crate::message::{
    AlertRecord, BeaconSnapshot, BuildingConfig, BuildingLayout, FirefighterTelemetry,
    InboundMessage,
};
use crate::state::alerts::{AlertLog, UpsertOutcome};
use crate::state::deriver::{AlertDeriver, FirefighterConditions};
use crate::state::snapshot::{LiveSnapshot, StoreChange};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Live store limits and thresholds
#[derive(Clone, Debug, Deserialize)]
pub struct StoreConfig {
    /// Maximum alerts kept, oldest evicted first
    #[serde(default = "default_alert_capacity")]
    pub alert_capacity: usize,
    /// Stationary seconds at which a firefighter is considered down
    #[serde(default = "default_man_down_threshold")]
    pub man_down_threshold_s: f64,
}

fn default_alert_capacity() -> usize {
    50
}

fn default_man_down_threshold() -> f64 {
    30.0
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            alert_capacity: default_alert_capacity(),
            man_down_threshold_s: default_man_down_threshold(),
        }
    }
}

/// In-memory projection of the live stream.
///
/// Has exactly one writer. Every mutation goes through `apply`,
/// `acknowledge` or `set_connected`, each of which is a single transaction.
pub struct LiveStore {
    firefighters: BTreeMap<String, FirefighterTelemetry>,
    beacons: Option<BeaconSnapshot>,
    building: Option<BuildingLayout>,
    alerts: AlertLog,
    deriver: AlertDeriver,
    connected: bool,
    last_update: Option<DateTime<Utc>>,
}

impl LiveStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            firefighters: BTreeMap::new(),
            beacons: None,
            building: None,
            alerts: AlertLog::new(config.alert_capacity),
            deriver: AlertDeriver::new(config.man_down_threshold_s),
            connected: false,
            last_update: None,
        }
    }

    /// Apply one decoded message
    pub fn apply(&mut self, message: InboundMessage, now: DateTime<Utc>) -> Vec<StoreChange> {
        let changes = match message {
            InboundMessage::Telemetry(telemetry) => self.apply_telemetry(*telemetry, now),
            InboundMessage::Beacons(snapshot) => self.replace_beacons(snapshot),
            InboundMessage::Layout(config) => self.replace_layout(config),
            InboundMessage::Alert(alert) => self.upsert_alert(alert),
        };
        self.last_update = Some(now);
        changes
    }

    fn apply_telemetry(
        &mut self,
        telemetry: FirefighterTelemetry,
        now: DateTime<Utc>,
    ) -> Vec<StoreChange> {
        let mut changes = Vec::new();

        let raised = self.deriver.evaluate(&telemetry, &self.alerts, now);

        changes.push(StoreChange::TelemetryUpdated {
            firefighter_id: telemetry.firefighter_id().to_string(),
            sequence: telemetry.sequence,
        });
        self.firefighters
            .insert(telemetry.firefighter_id().to_string(), telemetry);

        for alert in raised {
            let alert_id = alert.id.clone();
            let evicted = self.alerts.push_front(alert);
            changes.extend(self.inserted(&alert_id, evicted));
        }

        changes
    }

    /// Changes for a newly inserted alert. An alert evicted on arrival (the
    /// list holds nothing) is neither raised nor evicted.
    fn inserted(&self, alert_id: &str, evicted: Option<AlertRecord>) -> Vec<StoreChange> {
        let mut changes = Vec::new();
        match evicted {
            Some(evicted) if evicted.id == alert_id => {
                debug!(alert_id = %alert_id, "Alert list has no room, alert dropped");
                return changes;
            }
            Some(evicted) => changes.push(StoreChange::AlertEvicted {
                alert_id: evicted.id,
            }),
            None => {}
        }
        if let Some(alert) = self.alerts.get(alert_id) {
            changes.push(StoreChange::AlertRaised(alert.clone()));
        }
        changes
    }

    fn replace_beacons(&mut self, snapshot: BeaconSnapshot) -> Vec<StoreChange> {
        let count = snapshot.beacons.len();
        debug!(beacons = count, "Beacon set replaced");
        self.beacons = Some(snapshot);
        vec![StoreChange::BeaconsReplaced { count }]
    }

    fn replace_layout(&mut self, config: BuildingConfig) -> Vec<StoreChange> {
        let building_id = config.building.id.clone();
        info!(
            building_id = %building_id,
            floors = config.building.floors.len(),
            "Building layout received"
        );
        self.building = Some(config.building);
        vec![StoreChange::LayoutReplaced { building_id }]
    }

    fn upsert_alert(&mut self, alert: AlertRecord) -> Vec<StoreChange> {
        let alert_id = alert.id.clone();
        match self.alerts.upsert(alert) {
            UpsertOutcome::Replaced => {
                debug!(alert_id = %alert_id, "Alert updated in place");
                self.alerts
                    .get(&alert_id)
                    .cloned()
                    .map(StoreChange::AlertUpdated)
                    .into_iter()
                    .collect()
            }
            UpsertOutcome::Inserted { evicted } => {
                info!(alert_id = %alert_id, "Alert received");
                self.inserted(&alert_id, evicted)
            }
        }
    }

    /// Optimistically acknowledge an alert.
    ///
    /// Returns false (and changes nothing) when the id is not in the list.
    pub fn acknowledge(&mut self, alert_id: &str) -> bool {
        self.alerts.acknowledge(alert_id)
    }

    pub fn set_connected(&mut self, connected: bool) -> Option<StoreChange> {
        if self.connected == connected {
            return None;
        }
        self.connected = connected;
        Some(StoreChange::ConnectivityChanged { connected })
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn firefighter(&self, firefighter_id: &str) -> Option<&FirefighterTelemetry> {
        self.firefighters.get(firefighter_id)
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn conditions(&self, firefighter_id: &str) -> FirefighterConditions {
        self.deriver.conditions(firefighter_id)
    }

    /// Copy the current state out for readers
    pub fn snapshot(&self) -> LiveSnapshot {
        LiveSnapshot {
            firefighters: self.firefighters.clone(),
            beacons: self.beacons.clone(),
            building: self.building.clone(),
            alerts: self.alerts.to_vec(),
            connected: self.connected,
            last_update: self.last_update,
            conditions: self.deriver.all_conditions().clone(),
        }
    }
}

impl Default for LiveStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}
