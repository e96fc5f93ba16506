use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Filter for the history endpoints. Every field is optional; omitted
/// fields are left out of the query string.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Case-insensitive substring of a firefighter's name or tag id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firefighter: Option<String>,
}

impl HistoryQuery {
    /// Window ending at `now`
    pub fn window(now: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start_time: Some(now - length),
            end_time: Some(now),
            firefighter: None,
        }
    }

    pub fn last_hours(now: DateTime<Utc>, hours: i64) -> Self {
        Self::window(now, Duration::hours(hours))
    }

    pub fn last_days(now: DateTime<Utc>, days: i64) -> Self {
        Self::window(now, Duration::days(days))
    }

    /// Default range of the alert and telemetry history view
    pub fn history_default(now: DateTime<Utc>) -> Self {
        Self::last_hours(now, 24)
    }

    /// Default range of the track playback view
    pub fn tracking_default(now: DateTime<Utc>) -> Self {
        Self::last_hours(now, 1)
    }

    /// Set the firefighter filter. A blank filter clears it.
    pub fn with_firefighter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        let filter = filter.trim();
        self.firefighter = if filter.is_empty() {
            None
        } else {
            Some(filter.to_string())
        };
        self
    }

    /// URL-encoded query string, without the leading `?`
    pub fn to_query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(self)
    }
}
