use crate::message::{AlertKind, AlertOrigin, AlertRecord, FirefighterTelemetry, Severity};
use crate::state::alerts::AlertLog;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Per-condition edge state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConditionState {
    #[default]
    Quiescent,
    Alerting,
}

/// Edge-detection state kept for each firefighter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FirefighterConditions {
    pub man_down: ConditionState,
    pub sos: ConditionState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Rising,
    Falling,
    Steady,
}

fn step(state: &mut ConditionState, active: bool) -> Edge {
    match (*state, active) {
        (ConditionState::Quiescent, true) => {
            *state = ConditionState::Alerting;
            Edge::Rising
        }
        (ConditionState::Alerting, false) => {
            *state = ConditionState::Quiescent;
            Edge::Falling
        }
        _ => Edge::Steady,
    }
}

/// Synthesizes man-down and SOS alerts from raw telemetry.
///
/// Alerts fire on the quiescent → alerting edge only. A falling edge re-arms
/// the condition; it does not resolve the alert that was raised earlier.
#[derive(Clone, Debug)]
pub struct AlertDeriver {
    man_down_threshold_s: f64,
    conditions: BTreeMap<String, FirefighterConditions>,
}

impl AlertDeriver {
    pub fn new(man_down_threshold_s: f64) -> Self {
        Self {
            man_down_threshold_s,
            conditions: BTreeMap::new(),
        }
    }

    /// Advance edge state for one telemetry sample and return any alerts to raise.
    ///
    /// `alerts` is consulted so a condition the backend has already reported
    /// for this firefighter is not duplicated locally.
    pub fn evaluate(
        &mut self,
        telemetry: &FirefighterTelemetry,
        alerts: &AlertLog,
        now: DateTime<Utc>,
    ) -> Vec<AlertRecord> {
        let firefighter_id = telemetry.firefighter_id();
        let conditions = self
            .conditions
            .entry(firefighter_id.to_string())
            .or_default();

        let checks = [
            (
                AlertKind::ManDown,
                step(
                    &mut conditions.man_down,
                    telemetry.vitals.stationary_duration_s >= self.man_down_threshold_s,
                ),
            ),
            (
                AlertKind::SosPressed,
                step(&mut conditions.sos, telemetry.device.sos_button_pressed),
            ),
        ];

        let mut raised = Vec::new();
        for (kind, edge) in checks {
            match edge {
                Edge::Rising => {
                    if alerts.has_active_server_alert(kind, firefighter_id) {
                        info!(
                            firefighter_id = %firefighter_id,
                            kind = %kind,
                            "Condition already reported by backend, not raising local alert"
                        );
                        continue;
                    }
                    let alert = local_alert(kind, telemetry, now);
                    warn!(
                        firefighter_id = %firefighter_id,
                        alert_id = %alert.id,
                        kind = %kind,
                        "Local alert raised"
                    );
                    raised.push(alert);
                }
                Edge::Falling => {
                    info!(firefighter_id = %firefighter_id, kind = %kind, "Condition cleared, re-armed");
                }
                Edge::Steady => {}
            }
        }

        raised
    }

    pub fn conditions(&self, firefighter_id: &str) -> FirefighterConditions {
        self.conditions
            .get(firefighter_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn all_conditions(&self) -> &BTreeMap<String, FirefighterConditions> {
        &self.conditions
    }
}

fn local_alert(kind: AlertKind, telemetry: &FirefighterTelemetry, now: DateTime<Utc>) -> AlertRecord {
    let details = match kind {
        AlertKind::ManDown => json!({
            "stationary_duration_s": telemetry.vitals.stationary_duration_s,
        }),
        _ => json!({ "sos_button_pressed": true }),
    };

    AlertRecord {
        id: format!(
            "LOCAL-{}-{}-{}",
            kind,
            telemetry.firefighter_id(),
            Uuid::now_v7()
        ),
        timestamp: now,
        kind,
        severity: Severity::Critical,
        tag_id: telemetry.tag_id.clone(),
        firefighter: Some(telemetry.firefighter.clone()),
        position: telemetry.position.clone(),
        details,
        resolved: false,
        acknowledged: false,
        origin: AlertOrigin::Local,
    }
}
