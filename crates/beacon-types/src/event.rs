use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// NOTE: Schema Design Goals
//
// 1. Append-only: events are immutable once written by an instrumented
//    client and retained indefinitely upstream. Everything else in the
//    system (sessions, summaries, snapshots) is derived and recomputable.
// 2. Tolerance: machine_id and session_id arrive empty or missing on
//    malformed rows. Such events are excluded from the views that key on
//    the missing field but still count in raw aggregates.
// 3. Opaque details: the detail map is client-defined. The engine only
//    interprets the distinguished `license_key` entry.

/// Detail-map key carrying a license key reference.
pub const LICENSE_KEY_DETAIL: &str = "license_key";

/// Lifecycle event name marking the beginning of a session.
pub const SESSION_START_EVENT: &str = "session_start";

/// Coarse event classification reported by instrumented clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Lifecycle,
    Action,
    Error,
    Barrier,
    Workflow,
    /// Forward-compatibility catch-all for types this build does not know.
    #[serde(other)]
    Unknown,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Lifecycle => "lifecycle",
            EventType::Action => "action",
            EventType::Error => "error",
            EventType::Barrier => "barrier",
            EventType::Workflow => "workflow",
            EventType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single usage event reported by an instrumented client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Unique event ID.
    pub id: Uuid,

    /// Reporting device. Events without one are excluded from the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,

    /// Session grouping key. Events without one are excluded from session
    /// views but still counted in raw aggregates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Event timestamp (UTC).
    pub timestamp: DateTime<Utc>,

    pub event_name: String,
    pub event_type: EventType,

    #[serde(default)]
    pub app_version: String,

    #[serde(default)]
    pub os: String,

    /// Opaque client-supplied key/value payload.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl UsageEvent {
    /// Machine id, treating empty strings as absent.
    pub fn machine(&self) -> Option<&str> {
        self.machine_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Session id, treating empty strings as absent.
    pub fn session(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }

    /// License key carried in the detail map, if any.
    pub fn license_key(&self) -> Option<&str> {
        self.details
            .get(LICENSE_KEY_DETAIL)
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
    }

    pub fn is_session_start(&self) -> bool {
        self.event_name == SESSION_START_EVENT
    }
}

/// Lightweight per-launch ping, one row per application start.
///
/// Much cheaper to fetch than the full event log; feeds the quick usage
/// overview counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub machine_id: String,
    pub is_licensed: bool,
    pub timestamp: DateTime<Utc>,
}
