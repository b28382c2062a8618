use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::UsageEvent;

/// Derived grouping of events sharing a session id, bounded by the first
/// and last observed timestamp.
///
/// Sessions are never persisted; they are recomputed on every aggregation
/// pass from the current event set and live only inside a cache entry or a
/// single view build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,

    /// First machine observed for this session. `None` when no event in the
    /// group carried a machine id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// Whole seconds between the first and last event. Always `>= 0`.
    pub duration_seconds: i64,

    pub event_count: usize,

    /// Chronologically ascending event list. Empty for skeleton sessions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<UsageEvent>,

    /// `false` when the session was recovered from the long-tail skeleton
    /// scan: only existence and start time are known, and duration-derived
    /// figures must not use it.
    pub has_detailed_data: bool,
}
