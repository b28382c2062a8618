use std::collections::HashMap;
use std::fmt;

use beacon_types::{License, UsageEvent};
use chrono::SecondsFormat;

/// Fixed export header line, emitted verbatim.
pub const EXPORT_HEADER: &str = "timestamp, machine_id, session_id, event_name, event_type, app_version, os, is_licensed, customer_name, customer_email, license_key, event_details";

/// Result type for export serialization
pub type Result<T> = std::result::Result<T, ExportError>;

/// Error types that can occur while rendering an export document
#[derive(Debug)]
pub enum ExportError {
    /// CSV row could not be written
    Csv(csv::Error),

    /// Buffered output could not be reclaimed
    Io(std::io::Error),

    /// A detail map could not be rendered as JSON
    Json(serde_json::Error),

    /// The rendered document was not valid UTF-8
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Csv(err) => write!(f, "CSV error: {}", err),
            ExportError::Io(err) => write!(f, "IO error: {}", err),
            ExportError::Json(err) => write!(f, "Detail serialization error: {}", err),
            ExportError::Utf8(err) => write!(f, "Encoding error: {}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Csv(err) => Some(err),
            ExportError::Io(err) => Some(err),
            ExportError::Json(err) => Some(err),
            ExportError::Utf8(err) => Some(err),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err)
    }
}

/// Render the export document: the fixed header line followed by one
/// RFC4180 row per event, in the order the events were supplied.
///
/// Each event is joined to a license through its own `license_key` detail.
/// An unmatched key still prints in the `license_key` column (the export is
/// a data dump) but leaves `is_licensed` false and the customer fields
/// empty. Timestamps are ISO-8601; the detail map is rendered as a single
/// JSON string and escaped like any other field.
pub fn render_export(events: &[UsageEvent], licenses: &[License]) -> Result<String> {
    let by_key: HashMap<&str, &License> = licenses
        .iter()
        .map(|license| (license.key.as_str(), license))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    for event in events {
        let key = event.license_key();
        let license = key.and_then(|key| by_key.get(key).copied());
        let details = if event.details.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&event.details).map_err(ExportError::Json)?
        };

        writer.write_record([
            event
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Secs, true)
                .as_str(),
            event.machine().unwrap_or(""),
            event.session().unwrap_or(""),
            event.event_name.as_str(),
            event.event_type.as_str(),
            event.app_version.as_str(),
            event.os.as_str(),
            if license.is_some() { "true" } else { "false" },
            license.map(|l| l.customer_name.as_str()).unwrap_or(""),
            license.map(|l| l.customer_email.as_str()).unwrap_or(""),
            key.unwrap_or(""),
            details.as_str(),
        ])?;
    }

    let body = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;
    let body = String::from_utf8(body).map_err(ExportError::Utf8)?;

    let mut document = String::with_capacity(EXPORT_HEADER.len() + 1 + body.len());
    document.push_str(EXPORT_HEADER);
    document.push('\n');
    document.push_str(&body);
    Ok(document)
}
