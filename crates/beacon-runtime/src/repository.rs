use async_trait::async_trait;
use beacon_types::{License, UsageEvent, UsageRecord};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;

/// Filter over the event log. Clauses are conjunctive; `None` matches
/// everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub machine_id: Option<String>,
    pub session_id: Option<String>,
    pub event_name: Option<String>,
    /// Inclusive lower timestamp bound.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper timestamp bound.
    pub until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    TimestampAsc,
    TimestampDesc,
}

/// Resume position for paginated queries: the last row of the previous
/// page. The repository returns rows strictly past this position in the
/// requested order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub timestamp: DateTime<Utc>,
    pub event_id: Uuid,
}

impl PageCursor {
    pub fn after(event: &UsageEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            event_id: event.id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub filter: EventFilter,
    pub order: SortOrder,
    /// Page size; `None` returns everything that matches.
    pub limit: Option<usize>,
    pub cursor: Option<PageCursor>,
}

#[derive(Debug, Clone)]
pub struct EventPage {
    pub events: Vec<UsageEvent>,
    pub has_more: bool,
}

/// Paginated, filterable read access to the append-only event log.
///
/// Responsibilities:
/// - Serve filtered, ordered, cursor-paginated slices of the log
/// - Own every network/auth/timeout concern; this layer adds none
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn query(&self, query: EventQuery) -> Result<EventPage>;
}

/// Read access to license records.
#[async_trait]
pub trait LicenseRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<License>>;
}

/// Read access to per-launch usage pings.
#[async_trait]
pub trait UsageRecordRepository: Send + Sync {
    async fn fetch_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<UsageRecord>>;
}

/// Drain every matching event through the cursor protocol: pages of
/// `page_size`, the last row of each page seeding the next cursor, and a
/// short page signalling exhaustion. The first failed page aborts the whole
/// drain with nothing accumulated for the caller.
pub async fn fetch_all_events(
    repository: &dyn EventRepository,
    filter: EventFilter,
    order: SortOrder,
    page_size: usize,
) -> Result<Vec<UsageEvent>> {
    let page_size = page_size.max(1);
    let mut collected = Vec::new();
    let mut cursor = None;

    loop {
        let page = repository
            .query(EventQuery {
                filter: filter.clone(),
                order,
                limit: Some(page_size),
                cursor,
            })
            .await?;
        let fetched = page.events.len();
        cursor = page.events.last().map(PageCursor::after);
        collected.extend(page.events);
        if fetched < page_size {
            break;
        }
    }

    Ok(collected)
}
