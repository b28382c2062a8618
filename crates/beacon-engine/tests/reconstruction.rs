//! End-to-end engine pass: raw events through reconstruction into a
//! snapshot, checking the cross-module invariants.

use beacon_engine::{StatWindows, compute_snapshot, reconstruct_sessions};
use beacon_types::{EventType, LICENSE_KEY_DETAIL, SESSION_START_EVENT, UsageEvent};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
}

fn event(machine: &str, session: &str, name: &str, offset_secs: i64) -> UsageEvent {
    UsageEvent {
        id: Uuid::new_v4(),
        machine_id: Some(machine.to_string()),
        session_id: Some(session.to_string()),
        timestamp: base() + Duration::seconds(offset_secs),
        event_name: name.to_string(),
        event_type: if name == SESSION_START_EVENT {
            EventType::Lifecycle
        } else {
            EventType::Action
        },
        app_version: "1.4.0".to_string(),
        os: "windows".to_string(),
        details: serde_json::Map::new(),
    }
}

#[test]
fn snapshot_from_reconstructed_sessions() {
    // Machine A: two sessions. Machine B: one session, licensed.
    let mut events = vec![
        event("A", "S1", SESSION_START_EVENT, 0),
        event("A", "S1", "polygon_created", 120),
        event("A", "S2", SESSION_START_EVENT, 4000),
        event("A", "S2", "button_click", 4030),
        event("B", "S3", SESSION_START_EVENT, 2000),
        event("B", "S3", "sprinkler_type_selected", 2700),
    ];
    events[4].details.insert(
        LICENSE_KEY_DETAIL.to_string(),
        Value::String("AAAA-BBBB".to_string()),
    );

    let reconstruction = reconstruct_sessions(&events, DateTime::<Utc>::MIN_UTC);
    assert_eq!(reconstruction.sessions.len(), 3);
    assert!(reconstruction.anomalies.is_empty());

    let windows = StatWindows::at(base() + Duration::days(1));
    let snapshot = compute_snapshot(&events, &reconstruction.sessions, &windows);

    assert_eq!(snapshot.all_time.unique_users, 2);
    assert_eq!(snapshot.all_time.licensed_users, 1);
    assert!(snapshot.all_time.unique_users >= snapshot.all_time.licensed_users);

    // A has two sessions, B has one: 50% retention.
    assert_eq!(snapshot.all_time.retention_rate, 50.0);
    assert!(snapshot.all_time.retention_rate >= 0.0 && snapshot.all_time.retention_rate <= 100.0);

    // Durations: S1 = 120 s (2 min), S2 = 30 s (0.5 min), S3 = 700 s.
    let buckets = &snapshot.sessions;
    assert_eq!(buckets.under_one_minute, 1);
    assert_eq!(buckets.one_to_ten_minutes, 1);
    assert_eq!(buckets.ten_minutes_or_more, 1);
    assert_eq!(buckets.median_duration_seconds, 120);

    assert_eq!(snapshot.events.get(SESSION_START_EVENT), Some(&3));
    assert_eq!(snapshot.platform.get("windows"), Some(&6));
}

#[test]
fn skeleton_history_keeps_retention_but_not_durations() {
    // One machine with an old (skeleton) session and a recent detailed one.
    let detail_start = base() + Duration::hours(10);
    let events = vec![
        event("A", "OLD", SESSION_START_EVENT, 0),
        event("A", "NEW", SESSION_START_EVENT, 40_000),
        event("A", "NEW", "button_click", 40_090),
    ];

    let reconstruction = reconstruct_sessions(&events, detail_start);
    let windows = StatWindows::at(base() + Duration::days(1));
    let snapshot = compute_snapshot(&events, &reconstruction.sessions, &windows);

    // Both sessions exist, so the machine is retained.
    assert_eq!(snapshot.all_time.retention_rate, 100.0);

    // Only the detailed session contributes a duration (90 s = 1.5 min).
    assert_eq!(snapshot.all_time.total_session_minutes, 1.5);
    assert_eq!(snapshot.sessions.under_one_minute, 0);
    assert_eq!(snapshot.sessions.one_to_ten_minutes, 1);
    assert_eq!(snapshot.sessions.ten_minutes_or_more, 0);
}
