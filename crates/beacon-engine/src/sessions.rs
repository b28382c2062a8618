use std::collections::{HashMap, HashSet};

use beacon_types::{Session, UsageEvent};
use chrono::{DateTime, Utc};

use crate::diagnostics::IntegrityAnomaly;

/// Outcome of a reconstruction pass: sessions newest-first plus any
/// integrity anomalies observed while grouping.
#[derive(Debug, Clone, Default)]
pub struct Reconstruction {
    pub sessions: Vec<Session>,
    pub anomalies: Vec<IntegrityAnomaly>,
}

struct SessionDraft {
    first: DateTime<Utc>,
    last: DateTime<Utc>,
    events: Vec<UsageEvent>,
}

/// Reconstruct sessions from an unordered event collection.
///
/// Two-tier policy: a skeleton set is built from `session_start` events
/// across the entire history (existence and start time only, cheap), and a
/// full-detail set from events at or after `detail_window_start` (complete
/// bounds, counts, and sorted event lists). The sets merge by session id
/// with full detail winning; skeleton-only sessions are flagged
/// `has_detailed_data = false`. This bounds the cost of serving long-tail
/// history while keeping anything recent complete.
///
/// Single O(n) passes, O(distinct sessions) space. Events without a
/// session id are skipped here; raw aggregates count them elsewhere.
pub fn reconstruct_sessions(
    events: &[UsageEvent],
    detail_window_start: DateTime<Utc>,
) -> Reconstruction {
    let mut anomalies = Vec::new();

    // Machine attribution over the full history: the first machine observed
    // for a session wins. A session seen under a second machine is a
    // data-integrity violation and is reported, never merged.
    let mut machines: HashMap<&str, &str> = HashMap::new();
    let mut flagged: HashSet<&str> = HashSet::new();
    for event in events {
        let (Some(session_id), Some(machine_id)) = (event.session(), event.machine()) else {
            continue;
        };
        match machines.get(session_id).copied() {
            None => {
                machines.insert(session_id, machine_id);
            }
            Some(kept) if kept != machine_id => {
                if flagged.insert(session_id) {
                    anomalies.push(IntegrityAnomaly::SessionSpansMachines {
                        session_id: session_id.to_string(),
                        kept: kept.to_string(),
                        observed: machine_id.to_string(),
                    });
                }
            }
            Some(_) => {}
        }
    }

    // Tier 1: skeleton start times across the entire history.
    let mut starts: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for event in events {
        let Some(session_id) = event.session() else {
            continue;
        };
        if !event.is_session_start() {
            continue;
        }
        starts
            .entry(session_id)
            .and_modify(|start| {
                if event.timestamp < *start {
                    *start = event.timestamp;
                }
            })
            .or_insert(event.timestamp);
    }

    // Tier 2: full detail over the bounded recent window.
    let mut drafts: HashMap<&str, SessionDraft> = HashMap::new();
    for event in events {
        if event.timestamp < detail_window_start {
            continue;
        }
        let Some(session_id) = event.session() else {
            continue;
        };
        let draft = drafts.entry(session_id).or_insert_with(|| SessionDraft {
            first: event.timestamp,
            last: event.timestamp,
            events: Vec::new(),
        });
        if event.timestamp < draft.first {
            draft.first = event.timestamp;
        }
        if event.timestamp > draft.last {
            draft.last = event.timestamp;
        }
        draft.events.push(event.clone());
    }

    let detailed: HashSet<&str> = drafts.keys().copied().collect();

    let mut sessions = Vec::with_capacity(drafts.len() + starts.len());
    for (session_id, mut draft) in drafts {
        draft.events.sort_by_key(|event| event.timestamp);
        sessions.push(Session {
            session_id: session_id.to_string(),
            machine_id: machines.get(session_id).map(|machine| machine.to_string()),
            start_time: draft.first,
            end_time: draft.last,
            duration_seconds: (draft.last - draft.first).num_seconds(),
            event_count: draft.events.len(),
            events: draft.events,
            has_detailed_data: true,
        });
    }

    // Merge: skeleton entries fill in only where no detailed session exists.
    for (session_id, start) in starts {
        if detailed.contains(session_id) {
            continue;
        }
        sessions.push(Session {
            session_id: session_id.to_string(),
            machine_id: machines.get(session_id).map(|machine| machine.to_string()),
            start_time: start,
            end_time: start,
            duration_seconds: 0,
            event_count: 0,
            events: Vec::new(),
            has_detailed_data: false,
        });
    }

    // Newest first, matching the drill-down view ordering.
    sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));

    Reconstruction {
        sessions,
        anomalies,
    }
}
