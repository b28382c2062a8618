use std::path::Path;
use std::sync::Arc;

use beacon_engine::{day_bounds, render_export};
use chrono::NaiveDate;

use crate::error::Result;
use crate::repository::{
    EventFilter, EventRepository, LicenseRepository, SortOrder, fetch_all_events,
};

/// Cursor-paginated bulk export over an inclusive local-day range.
///
/// The first failed page aborts the whole run: nothing is written and no
/// retry is attempted, so the caller restarts the export from scratch.
/// Cancellation is not supported mid-run; already-issued page fetches
/// complete on their own.
pub struct ExportService {
    events: Arc<dyn EventRepository>,
    licenses: Arc<dyn LicenseRepository>,
    page_size: usize,
}

impl ExportService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        licenses: Arc<dyn LicenseRepository>,
        page_size: usize,
    ) -> Self {
        Self {
            events,
            licenses,
            page_size,
        }
    }

    /// Render the export document for `start..=end`, newest events first.
    pub async fn export_range(&self, start: NaiveDate, end: NaiveDate) -> Result<String> {
        let (since, until) = day_bounds(start, end);
        let filter = EventFilter {
            since: Some(since),
            until: Some(until),
            ..Default::default()
        };

        // License table and the page loop go out together.
        let (licenses, events) = tokio::try_join!(
            self.licenses.get_all(),
            fetch_all_events(
                self.events.as_ref(),
                filter,
                SortOrder::TimestampDesc,
                self.page_size,
            ),
        )?;

        Ok(render_export(&events, &licenses)?)
    }

    /// Export to a file. The document is fully materialized before the
    /// first byte is written, so an aborted export leaves no partial file.
    pub async fn export_to_path(&self, path: &Path, start: NaiveDate, end: NaiveDate) -> Result<()> {
        let document = self.export_range(start, end).await?;
        std::fs::write(path, document)?;
        Ok(())
    }
}
