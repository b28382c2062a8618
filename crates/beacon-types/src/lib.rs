pub mod counts;
pub mod event;
pub mod license;
pub mod machine;
pub mod session;
pub mod stats;

pub use counts::CountMap;
pub use event::{EventType, LICENSE_KEY_DETAIL, SESSION_START_EVENT, UsageEvent, UsageRecord};
pub use license::{License, LicenseStatus};
pub use machine::{LicenseAttribution, MachineSummary};
pub use session::Session;
pub use stats::{QuickStats, SessionBuckets, StatsSnapshot, UsageMetrics};
