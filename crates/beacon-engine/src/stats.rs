use std::collections::{HashMap, HashSet};

use beacon_types::{
    CountMap, QuickStats, Session, SessionBuckets, StatsSnapshot, UsageEvent, UsageMetrics,
    UsageRecord,
};
use chrono::{DateTime, Utc};

use crate::time::StatWindows;

/// Minimum charged duration per session, in minutes. Zero-length sessions
/// (typically single-event) would otherwise drag averages to zero.
const MIN_SESSION_MINUTES: f64 = 0.1;

/// Compute the full snapshot from an event set and its reconstructed
/// sessions. Window boundaries are supplied by the caller so every figure
/// shares one clock reading.
pub fn compute_snapshot(
    events: &[UsageEvent],
    sessions: &[Session],
    windows: &StatWindows,
) -> StatsSnapshot {
    let all_events: Vec<&UsageEvent> = events.iter().collect();
    let all_sessions: Vec<&Session> = sessions.iter().collect();

    let today_events: Vec<&UsageEvent> = events
        .iter()
        .filter(|event| event.timestamp >= windows.today_start)
        .collect();
    let today_sessions: Vec<&Session> = sessions
        .iter()
        .filter(|session| session.start_time >= windows.today_start)
        .collect();

    let weekly_events: Vec<&UsageEvent> = events
        .iter()
        .filter(|event| event.timestamp >= windows.week_start)
        .collect();
    let weekly_sessions: Vec<&Session> = sessions
        .iter()
        .filter(|session| session.start_time >= windows.week_start)
        .collect();

    let mut platform = CountMap::new();
    let mut version = CountMap::new();
    let mut names = CountMap::new();
    for event in events {
        platform.increment(category(&event.os));
        version.increment(category(&event.app_version));
        names.increment(&event.event_name);
    }

    StatsSnapshot {
        all_time: usage_metrics(&all_events, &all_sessions),
        today: usage_metrics(&today_events, &today_sessions),
        weekly: usage_metrics(&weekly_events, &weekly_sessions),
        platform,
        version,
        events: names,
        sessions: session_buckets(&all_sessions),
    }
}

/// Engagement figures for one window.
///
/// Licensing here is the event-derived signal (a `license_key` detail on
/// any of the machine's events), independent of the license table; the two
/// can disagree and are deliberately not reconciled.
pub fn usage_metrics(events: &[&UsageEvent], sessions: &[&Session]) -> UsageMetrics {
    let mut unique: HashSet<&str> = HashSet::new();
    let mut licensed: HashSet<&str> = HashSet::new();
    for event in events {
        let Some(machine) = event.machine() else {
            continue;
        };
        unique.insert(machine);
        if event.license_key().is_some() {
            licensed.insert(machine);
        }
    }

    let mut sessions_per_machine: HashMap<&str, usize> = HashMap::new();
    for session in sessions {
        if let Some(machine) = session.machine_id.as_deref() {
            *sessions_per_machine.entry(machine).or_default() += 1;
        }
    }
    let returning = sessions_per_machine
        .values()
        .filter(|&&count| count > 1)
        .count();
    let retention_rate = if sessions_per_machine.is_empty() {
        0.0
    } else {
        (returning as f64 / sessions_per_machine.len() as f64 * 100.0).clamp(0.0, 100.0)
    };

    // Durations come from detailed sessions only: a skeleton session's
    // duration is unknown, not zero.
    let minutes: Vec<f64> = sessions
        .iter()
        .filter(|session| session.has_detailed_data)
        .map(|session| (session.duration_seconds as f64 / 60.0).max(MIN_SESSION_MINUTES))
        .collect();
    let total_session_minutes: f64 = minutes.iter().sum();
    let average_session_minutes = if minutes.is_empty() {
        0.0
    } else {
        total_session_minutes / minutes.len() as f64
    };

    UsageMetrics {
        unique_users: unique.len(),
        licensed_users: licensed.len(),
        total_session_minutes,
        average_session_minutes,
        retention_rate,
    }
}

/// Duration histogram and median over the detailed sessions.
pub fn session_buckets(sessions: &[&Session]) -> SessionBuckets {
    let mut durations: Vec<i64> = sessions
        .iter()
        .filter(|session| session.has_detailed_data)
        .map(|session| session.duration_seconds)
        .collect();
    durations.sort_unstable();

    let mut buckets = SessionBuckets::default();
    for &seconds in &durations {
        if seconds < 60 {
            buckets.under_one_minute += 1;
        } else if seconds < 600 {
            buckets.one_to_ten_minutes += 1;
        } else {
            buckets.ten_minutes_or_more += 1;
        }
    }

    // Even-length collections take the lower of the two middle elements,
    // not their average.
    buckets.median_duration_seconds = if durations.is_empty() {
        0
    } else {
        durations[(durations.len() - 1) / 2]
    };

    buckets
}

/// Quick counters over a trailing window of usage records.
pub fn quick_stats(records: &[UsageRecord], today_start: DateTime<Utc>) -> QuickStats {
    let mut unique: HashSet<&str> = HashSet::new();
    let mut licensed: HashSet<&str> = HashSet::new();
    let mut free: HashSet<&str> = HashSet::new();
    let mut today: HashSet<&str> = HashSet::new();

    for record in records {
        let machine = record.machine_id.as_str();
        unique.insert(machine);
        if record.is_licensed {
            licensed.insert(machine);
        } else {
            free.insert(machine);
        }
        if record.timestamp >= today_start {
            today.insert(machine);
        }
    }

    QuickStats {
        unique_machines: unique.len(),
        licensed_machines: licensed.len(),
        free_machines: free.len(),
        active_today: today.len(),
    }
}

fn category(raw: &str) -> &str {
    if raw.is_empty() { "unknown" } else { raw }
}
