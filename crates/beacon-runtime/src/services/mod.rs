mod analytics;
mod export;
mod inflight;

pub use analytics::AnalyticsService;
pub use export::ExportService;
