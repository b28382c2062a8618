//! Internal testing utilities: fixture builders and in-memory repository
//! collaborators with failure injection.

pub mod fixtures;
pub mod repos;

pub use fixtures::{EventBuilder, base_time, event, license, session_start, usage_record};
pub use repos::{InMemoryEventRepository, InMemoryLicenseRepository, InMemoryUsageRecordRepository};
