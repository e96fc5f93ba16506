//! Replay of recorded telemetry as per-firefighter tracks.
//!
//! [`TrackSet`] groups history rows into tracks, [`Playback`] is a cursor
//! over the merged timeline and [`PlaybackTimer`] advances that cursor on a
//! fixed period until it reaches the end or is stopped.

use crate::history::records::{RecordedFirefighter, TelemetryRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub floor: i32,
    pub timestamp: DateTime<Utc>,
    pub heart_rate: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub firefighter: RecordedFirefighter,
    /// Sorted by timestamp
    pub points: Vec<TrackPoint>,
    pub visible: bool,
}

impl Track {
    pub fn id(&self) -> &str {
        &self.firefighter.id
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackSet {
    tracks: Vec<Track>,
    timeline: Vec<DateTime<Utc>>,
}

impl TrackSet {
    /// Build tracks from history rows in any order. Tracks keep the order
    /// in which their firefighter first appears in time. Rows that lost
    /// their firefighter or position cannot be placed and are skipped.
    pub fn from_records(records: &[TelemetryRecord]) -> Self {
        let mut sorted: Vec<&TelemetryRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.timestamp);

        let mut tracks: Vec<Track> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut timeline = BTreeSet::new();
        let mut skipped = 0usize;

        for record in sorted {
            let (Some(firefighter), Some(position)) = (&record.firefighter, &record.position)
            else {
                skipped += 1;
                continue;
            };

            let slot = *index.entry(firefighter.id.as_str()).or_insert_with(|| {
                tracks.push(Track {
                    firefighter: firefighter.clone(),
                    points: Vec::new(),
                    visible: true,
                });
                tracks.len() - 1
            });

            tracks[slot].points.push(TrackPoint {
                x: position.x,
                y: position.y,
                z: position.z.unwrap_or(0.0),
                floor: position.floor,
                timestamp: record.timestamp,
                heart_rate: record.vitals.as_ref().map(|v| v.heart_rate_bpm),
            });
            timeline.insert(record.timestamp);
        }

        if skipped > 0 {
            debug!(skipped, "Telemetry rows without firefighter or position skipped");
        }

        Self {
            tracks,
            timeline: timeline.into_iter().collect(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, firefighter_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id() == firefighter_id)
    }

    pub fn visible_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.visible)
    }

    /// Flip a track's visibility. Returns the new state, or `None` for an
    /// unknown firefighter.
    pub fn toggle_visibility(&mut self, firefighter_id: &str) -> Option<bool> {
        let track = self.tracks.iter_mut().find(|t| t.id() == firefighter_id)?;
        track.visible = !track.visible;
        Some(track.visible)
    }

    /// Sorted, de-duplicated timestamps across all tracks
    pub fn timeline(&self) -> &[DateTime<Utc>] {
        &self.timeline
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Slowest playback multiplier
pub const MIN_SPEED: f64 = 0.5;
/// Fastest playback multiplier
pub const MAX_SPEED: f64 = 10.0;

/// Cursor over a timeline
#[derive(Clone, Debug, PartialEq)]
pub struct Playback {
    timeline: Vec<DateTime<Utc>>,
    index: usize,
    speed: f64,
    playing: bool,
}

impl Playback {
    pub fn new(tracks: &TrackSet) -> Self {
        Self {
            timeline: tracks.timeline().to_vec(),
            index: 0,
            speed: 1.0,
            playing: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Non-positive or non-finite speeds are ignored. Others are clamped to
    /// `MIN_SPEED..=MAX_SPEED`.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        }
    }

    /// Time between ticks at the current speed
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.speed)
    }

    pub fn current_time(&self) -> Option<DateTime<Utc>> {
        self.timeline.get(self.index).copied()
    }

    pub fn at_end(&self) -> bool {
        self.index + 1 >= self.timeline.len()
    }

    pub fn play(&mut self) {
        if !self.timeline.is_empty() {
            self.playing = true;
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Advance one step while playing. Reaching the end stops playback and
    /// returns false.
    pub fn tick(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        if self.at_end() {
            self.playing = false;
            return false;
        }
        self.index += 1;
        true
    }

    /// Jump to a timeline index, clamped to the last entry
    pub fn seek(&mut self, index: usize) {
        self.index = index.min(self.timeline.len().saturating_sub(1));
    }

    pub fn step_forward(&mut self) {
        self.seek(self.index + 1);
    }

    pub fn step_back(&mut self) {
        self.seek(self.index.saturating_sub(1));
    }

    pub fn rewind(&mut self) {
        self.index = 0;
        self.playing = false;
    }

    /// Points of `track` on `floor` up to the cursor. With an empty timeline
    /// every point on the floor is visible.
    pub fn visible_points<'a>(&self, track: &'a Track, floor: i32) -> Vec<&'a TrackPoint> {
        let cutoff = self.current_time();
        track
            .points
            .iter()
            .filter(|p| p.floor == floor)
            .filter(|p| cutoff.map_or(true, |at| p.timestamp <= at))
            .collect()
    }

    /// Last point of `track` at or before the cursor
    pub fn current_position<'a>(&self, track: &'a Track) -> Option<&'a TrackPoint> {
        match self.current_time() {
            Some(at) => track.points.iter().rev().find(|p| p.timestamp <= at),
            None => track.points.last(),
        }
    }
}

/// Background task ticking a [`Playback`] at `1 / speed` seconds.
///
/// Stops by itself at the end of the timeline. Dropping the timer without
/// calling [`PlaybackTimer::stop`] also cancels it.
pub struct PlaybackTimer {
    stop_tx: watch::Sender<bool>,
    position: watch::Receiver<usize>,
    handle: JoinHandle<Playback>,
}

impl PlaybackTimer {
    pub fn start(mut playback: Playback) -> Self {
        playback.play();
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let (position_tx, position) = watch::channel(playback.index());

        let handle = tokio::spawn(async move {
            let period = playback.tick_interval();
            debug!(
                period_ms = period.as_millis() as u64,
                steps = playback.len(),
                "Playback started"
            );

            while playback.is_playing() {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = tokio::time::sleep(period) => {
                        if playback.tick() {
                            let _ = position_tx.send(playback.index());
                        }
                    }
                }
            }

            playback.pause();
            debug!(index = playback.index(), "Playback stopped");
            playback
        });

        Self {
            stop_tx,
            position,
            handle,
        }
    }

    /// Cursor index, updated on every tick
    pub fn position(&self) -> watch::Receiver<usize> {
        self.position.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the timer and hand the cursor back, paused. No tick fires
    /// after this returns.
    pub async fn stop(self) -> Result<Playback> {
        let _ = self.stop_tx.send(true);
        self.handle.await.context("Playback task failed")
    }
}
