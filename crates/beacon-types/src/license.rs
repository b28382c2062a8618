use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored license state. Expired or never-activated licenses keep their
/// stored status; effective inactivity is derived, not written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    Active,
    Revoked,
}

/// License record as read from the license table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub key: String,
    pub customer_name: String,
    pub customer_email: String,
    pub status: LicenseStatus,
    pub expires_at: DateTime<Utc>,
    /// Set on first activation; `None` means the license was issued but
    /// never used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
}

impl License {
    /// Whether the license is usable at `now`: stored active, activated at
    /// least once, and not past its expiry date.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == LicenseStatus::Active
            && self.activated_at.is_some()
            && self.expires_at > now
    }
}
