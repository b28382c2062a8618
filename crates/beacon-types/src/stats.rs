use serde::{Deserialize, Serialize};

use crate::counts::CountMap;

/// Full analytics snapshot served by the comprehensive-stats view.
///
/// Ephemeral: held inside a cache entry or in memory for one view render,
/// never persisted on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub all_time: UsageMetrics,
    pub today: UsageMetrics,
    pub weekly: UsageMetrics,

    /// OS → event count, first-appearance ordered.
    pub platform: CountMap,
    /// App version → event count.
    pub version: CountMap,
    /// Event name → event count.
    pub events: CountMap,

    pub sessions: SessionBuckets,
}

/// Engagement figures for one time window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Distinct machines that reported at least one event in the window.
    pub unique_users: usize,

    /// Distinct machines with at least one event carrying a `license_key`
    /// detail. This is an event-derived signal, independent of the license
    /// table; the two can disagree and are deliberately not reconciled.
    pub licensed_users: usize,

    pub total_session_minutes: f64,
    pub average_session_minutes: f64,

    /// Percentage of machines with more than one reconstructed session,
    /// always within `0..=100`.
    pub retention_rate: f64,
}

/// Session duration histogram plus the median.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBuckets {
    pub under_one_minute: usize,
    pub one_to_ten_minutes: usize,
    pub ten_minutes_or_more: usize,

    /// Median of ascending durations. Even-length collections take the
    /// lower of the two middle elements, not their average. Zero when no
    /// detailed session exists.
    pub median_duration_seconds: i64,
}

/// Quick counters over the trailing usage-record window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickStats {
    pub unique_machines: usize,
    pub licensed_machines: usize,
    pub free_machines: usize,
    pub active_today: usize,
}
