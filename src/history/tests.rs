use super::*;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::time::Duration;

fn at(second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 18, 10, 0, second).unwrap()
}

fn record(id: i64, ff_id: &str, second: u32, floor: i32, x: f64) -> TelemetryRecord {
    serde_json::from_value(json!({
        "id": id,
        "firefighter": {
            "id": ff_id,
            "tag_id": format!("TAG-{}", ff_id),
            "name": format!("Firefighter {}", ff_id),
            "rank": "ogn.",
            "role": "Rota 1",
            "team": "Rota 1"
        },
        "position": { "id": id, "x": x, "y": 1.0, "z": 0.0, "floor": floor },
        "vitals": {
            "id": id,
            "heart_rate_bpm": 100 + id,
            "heart_rate_variability_ms": 40,
            "heart_rate_confidence": 0.9,
            "hr_zone": "moderate",
            "motion_state": "walking",
            "stationary_duration_s": 0
        },
        "type": "tag_telemetry",
        "timestamp": at(second),
        "sequence": id,
        "tag_id": format!("TAG-{}", ff_id),
        "heading_deg": 45.0
    }))
    .unwrap()
}

/// FF-B appears first in time even though its rows come last
fn sample_set() -> TrackSet {
    TrackSet::from_records(&[
        record(1, "FF-A", 2, 0, 1.0),
        record(2, "FF-A", 4, 1, 2.0),
        record(3, "FF-B", 1, 0, 5.0),
        record(4, "FF-B", 2, 0, 6.0),
        record(5, "FF-B", 3, 0, 7.0),
    ])
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[test]
fn test_telemetry_record_decoding() {
    let row = record(7, "FF-001", 0, 2, 3.5);
    assert_eq!(row.id, 7);
    assert_eq!(row.firefighter.as_ref().unwrap().tag_id, "TAG-FF-001");
    assert_eq!(row.position.as_ref().unwrap().floor, 2);
    assert_eq!(row.vitals.as_ref().unwrap().heart_rate_bpm, 107.0);
    assert_eq!(row.record_type, "tag_telemetry");
    assert_eq!(row.heading_deg, Some(45.0));
}

#[test]
fn test_telemetry_record_without_vitals() {
    let row: TelemetryRecord = serde_json::from_value(json!({
        "id": 1,
        "firefighter": { "id": "FF-001", "tag_id": "TAG-001", "name": "Jan" },
        "position": { "id": 1, "x": 1.0, "y": 2.0, "z": 0.0, "floor": 0 },
        "vitals": null,
        "type": "tag_telemetry",
        "timestamp": "2025-01-18T10:00:00Z",
        "sequence": 1,
        "tag_id": "TAG-001",
        "heading_deg": 0.0
    }))
    .unwrap();
    assert!(row.vitals.is_none());

    let tracks = TrackSet::from_records(&[row]);
    assert_eq!(tracks.tracks()[0].points[0].heart_rate, None);
}

#[test]
fn test_telemetry_record_with_null_columns() {
    let rows: Vec<TelemetryRecord> = serde_json::from_value(json!([
        {
            "id": 1,
            "firefighter": { "id": "FF-001", "tag_id": null, "name": "Jan", "rank": null, "role": null, "team": null },
            "position": { "id": 1, "x": 1.0, "y": 2.0, "z": null, "floor": 0 },
            "vitals": { "id": 1, "heart_rate_bpm": 90, "hr_zone": null, "motion_state": null },
            "type": "tag_telemetry",
            "timestamp": "2025-01-18T10:00:00Z",
            "sequence": 1,
            "tag_id": null,
            "heading_deg": null
        },
        {
            "id": 2,
            "firefighter": null,
            "position": null,
            "vitals": null,
            "type": "tag_telemetry",
            "timestamp": "2025-01-18T10:00:01Z",
            "sequence": 2,
            "tag_id": "TAG-009"
        },
        {
            "id": 3,
            "firefighter": { "id": "FF-002", "name": "Anna" },
            "position": null,
            "type": "tag_telemetry",
            "timestamp": "2025-01-18T10:00:02Z",
            "sequence": 3
        }
    ]))
    .unwrap();

    let first = rows[0].firefighter.as_ref().unwrap();
    assert_eq!(first.tag_id, "");
    assert_eq!(first.rank, "");
    assert_eq!(rows[0].tag_id, "");
    assert_eq!(rows[0].vitals.as_ref().unwrap().motion_state, "");
    assert!(rows[1].firefighter.is_none());
    assert!(rows[1].position.is_none());

    // Only the row with both a firefighter and a position can be plotted
    let tracks = TrackSet::from_records(&rows);
    assert_eq!(tracks.tracks().len(), 1);
    assert_eq!(tracks.track("FF-001").unwrap().points.len(), 1);
    assert!(tracks.track("FF-002").is_none());
    assert_eq!(tracks.timeline().len(), 1);
}

#[test]
fn test_alert_history_record_decoding() {
    let row: AlertHistoryRecord = serde_json::from_value(json!({
        "id": "ALERT-42",
        "firefighter": null,
        "position": { "id": 3, "x": 1.0, "y": 2.0, "z": null, "floor": 1 },
        "details": { "id": 3, "stationary_duration_s": 45, "last_motion_state": "stationary", "last_heart_rate": 60 },
        "type": "alert",
        "timestamp": "2025-01-18T10:00:00Z",
        "alert_type": "man_down",
        "severity": "critical",
        "tag_id": "TAG-001",
        "resolved": false,
        "acknowledged": true
    }))
    .unwrap();

    assert!(row.firefighter.is_none());
    assert_eq!(row.position.as_ref().unwrap().z, None);
    assert_eq!(row.kind(), Some(crate::message::AlertKind::ManDown));
    assert_eq!(row.label(), "Man Down");
    assert!(row.acknowledged);
}

#[test]
fn test_unknown_alert_type_keeps_raw_label() {
    let row: AlertHistoryRecord = serde_json::from_value(json!({
        "id": "ALERT-43",
        "timestamp": "2025-01-18T10:00:00Z",
        "alert_type": "water_ingress",
        "severity": "info"
    }))
    .unwrap();

    assert_eq!(row.kind(), None);
    assert_eq!(row.label(), "water_ingress");
}

#[test]
fn test_history_error_retryable() {
    let status = HistoryError::Status {
        endpoint: "/alerts/",
        status: 503,
    };
    assert!(status.is_retryable());
    assert_eq!(status.to_string(), "HTTP 503 from /alerts/");

    let decode = HistoryError::Decode(serde_json::from_str::<Vec<u8>>("{").unwrap_err());
    assert!(!decode.is_retryable());
}

#[test]
fn test_tracks_grouped_in_first_seen_order() {
    let set = sample_set();

    let ids: Vec<&str> = set.tracks().iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec!["FF-B", "FF-A"]);

    let a = set.track("FF-A").unwrap();
    assert_eq!(a.points.len(), 2);
    assert_eq!(a.points[0].timestamp, at(2));
    assert_eq!(a.points[1].floor, 1);
    assert!(a.visible);
}

#[test]
fn test_timeline_is_sorted_and_unique() {
    let set = sample_set();
    assert_eq!(set.timeline(), &[at(1), at(2), at(3), at(4)]);
}

#[test]
fn test_toggle_visibility() {
    let mut set = sample_set();

    assert_eq!(set.toggle_visibility("FF-A"), Some(false));
    assert_eq!(set.visible_tracks().count(), 1);
    assert_eq!(set.toggle_visibility("FF-A"), Some(true));
    assert_eq!(set.toggle_visibility("FF-Z"), None);
}

#[test]
fn test_visible_points_follow_cursor() {
    let set = sample_set();
    let b = set.track("FF-B").unwrap();
    let a = set.track("FF-A").unwrap();
    let mut playback = Playback::new(&set);

    // Cursor at 10:00:01
    assert_eq!(playback.visible_points(b, 0).len(), 1);
    assert!(playback.visible_points(a, 0).is_empty());
    assert!(playback.current_position(a).is_none());

    playback.seek(2);
    assert_eq!(playback.current_time(), Some(at(3)));
    assert_eq!(playback.visible_points(b, 0).len(), 3);
    assert_eq!(playback.visible_points(a, 0).len(), 1);
    assert!(playback.visible_points(a, 1).is_empty());
    assert_eq!(playback.current_position(a).unwrap().x, 1.0);
    assert_eq!(playback.current_position(b).unwrap().x, 7.0);

    playback.seek(99);
    assert_eq!(playback.index(), 3);
    assert_eq!(playback.current_position(a).unwrap().floor, 1);
}

#[test]
fn test_empty_timeline_shows_everything() {
    let set = TrackSet::default();
    let playback = Playback::new(&set);
    let track = sample_set().track("FF-B").unwrap().clone();

    assert!(playback.current_time().is_none());
    assert_eq!(playback.visible_points(&track, 0).len(), 3);
    assert_eq!(playback.current_position(&track).unwrap().x, 7.0);
}

#[test]
fn test_tick_stops_at_end() {
    let set = sample_set();
    let mut playback = Playback::new(&set);

    assert!(!playback.tick());
    playback.play();
    assert!(playback.tick());
    assert!(playback.tick());
    assert!(playback.tick());
    assert_eq!(playback.index(), 3);

    assert!(!playback.tick());
    assert!(!playback.is_playing());
    assert_eq!(playback.index(), 3);
}

#[test]
fn test_speed_sets_tick_interval() {
    let mut playback = Playback::new(&sample_set());
    assert_eq!(playback.tick_interval(), Duration::from_secs(1));

    playback.set_speed(4.0);
    assert_eq!(playback.tick_interval(), Duration::from_millis(250));

    playback.set_speed(0.0);
    playback.set_speed(-2.0);
    playback.set_speed(f64::NAN);
    assert_eq!(playback.speed(), 4.0);
}

#[test]
fn test_speed_is_clamped() {
    let mut playback = Playback::new(&sample_set());

    playback.set_speed(1e-300);
    assert_eq!(playback.speed(), MIN_SPEED);
    assert_eq!(playback.tick_interval(), Duration::from_secs(2));

    playback.set_speed(1e300);
    assert_eq!(playback.speed(), MAX_SPEED);
    assert_eq!(playback.tick_interval(), Duration::from_millis(100));
}

#[test]
fn test_stepping_and_rewind() {
    let mut playback = Playback::new(&sample_set());

    playback.step_back();
    assert_eq!(playback.index(), 0);
    playback.step_forward();
    playback.step_forward();
    assert_eq!(playback.index(), 2);

    playback.play();
    playback.rewind();
    assert_eq!(playback.index(), 0);
    assert!(!playback.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_timer_runs_to_end_and_stops() {
    let mut playback = Playback::new(&sample_set());
    playback.set_speed(2.0);

    let timer = PlaybackTimer::start(playback);
    let position = timer.position();
    settle().await;

    tokio::time::advance(Duration::from_millis(499)).await;
    settle().await;
    assert_eq!(*position.borrow(), 0);

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(*position.borrow(), 1);

    tokio::time::advance(Duration::from_millis(500)).await;
    settle().await;
    assert_eq!(*position.borrow(), 2);

    tokio::time::advance(Duration::from_millis(500)).await;
    settle().await;
    assert_eq!(*position.borrow(), 3);

    // One more period to notice the end
    tokio::time::advance(Duration::from_millis(500)).await;
    settle().await;
    assert!(timer.is_finished());

    let playback = timer.stop().await.unwrap();
    assert_eq!(playback.index(), 3);
    assert!(!playback.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_timer_never_ticks_after_stop() {
    let timer = PlaybackTimer::start(Playback::new(&sample_set()));
    let mut position = timer.position();
    settle().await;

    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(*position.borrow_and_update(), 1);

    let playback = timer.stop().await.unwrap();
    assert_eq!(playback.index(), 1);
    assert!(!playback.is_playing());

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(*position.borrow(), 1);
    assert!(position.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_timer_on_empty_timeline_finishes_immediately() {
    let timer = PlaybackTimer::start(Playback::new(&TrackSet::default()));
    settle().await;
    assert!(timer.is_finished());

    let playback = timer.stop().await.unwrap();
    assert_eq!(playback.index(), 0);
}
