use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::license::LicenseStatus;

/// One catalog row per distinct device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSummary {
    pub machine_id: String,

    /// Timestamp of the newest event observed for this machine.
    pub last_activity: DateTime<Utc>,

    /// Number of distinct session ids seen on this machine.
    pub session_count: usize,

    pub app_version: String,
    pub os: String,

    /// License joined through the earliest matching `license_key` detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<LicenseAttribution>,
}

/// License identity attached to a machine by the catalog join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseAttribution {
    pub key: String,
    pub customer_name: String,
    pub customer_email: String,
    pub status: LicenseStatus,
}
