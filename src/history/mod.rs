// Recorded telemetry and alerts: query client and track playback

mod client;
pub mod playback;
mod query;
mod records;

pub use client::{HistoryClient, HistoryConfig, HistoryError};
pub use playback::{Playback, PlaybackTimer, Track, TrackPoint, TrackSet, MAX_SPEED, MIN_SPEED};
pub use query::HistoryQuery;
pub use records::{
    AlertHistoryRecord, RecordedFirefighter, RecordedPosition, RecordedVitals, TelemetryRecord,
};

#[cfg(test)]
mod tests;
