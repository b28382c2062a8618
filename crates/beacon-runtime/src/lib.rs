pub mod config;
pub mod error;
pub mod repository;
pub mod services;

pub use config::AnalyticsConfig;
pub use error::{Error, Result};
pub use repository::{
    EventFilter, EventPage, EventQuery, EventRepository, LicenseRepository, PageCursor, SortOrder,
    UsageRecordRepository, fetch_all_events,
};
pub use services::{AnalyticsService, ExportService};

/// Cache schema tag for the running build, evaluated once at process start.
/// Bumping the crate version invalidates every previously cached payload.
pub const CACHE_VERSION_TAG: &str = env!("CARGO_PKG_VERSION");
