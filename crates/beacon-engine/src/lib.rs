pub mod catalog;
pub mod diagnostics;
pub mod export;
pub mod sessions;
pub mod stats;
pub mod time;

pub use catalog::{CatalogBuild, CatalogPage, build_catalog, page_catalog};
pub use diagnostics::IntegrityAnomaly;
pub use export::{EXPORT_HEADER, ExportError, render_export};
pub use sessions::{Reconstruction, reconstruct_sessions};
pub use stats::{compute_snapshot, quick_stats, session_buckets, usage_metrics};
pub use time::{StatWindows, day_bounds, local_to_utc};
