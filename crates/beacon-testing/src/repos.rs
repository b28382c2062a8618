//! In-memory repository collaborators mirroring the production contracts,
//! with call counting and failure injection for error-path tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use beacon_runtime::{
    Error, EventPage, EventQuery, EventRepository, LicenseRepository, Result, SortOrder,
    UsageRecordRepository,
};
use beacon_types::{License, UsageEvent, UsageRecord};
use chrono::{DateTime, Utc};

/// Event log backed by a plain vector.
///
/// Sorting, filtering, limit, and cursor semantics mirror the production
/// contract. `fail_after(n)` lets the next `n` queries succeed and fails
/// every one after that, which is how the export-abort paths are exercised.
#[derive(Default)]
pub struct InMemoryEventRepository {
    events: Mutex<Vec<UsageEvent>>,
    queries: AtomicUsize,
    fail_after: Mutex<Option<usize>>,
}

impl InMemoryEventRepository {
    pub fn new(events: Vec<UsageEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            queries: AtomicUsize::new(0),
            fail_after: Mutex::new(None),
        }
    }

    pub fn push(&self, event: UsageEvent) {
        self.events.lock().unwrap().push(event);
    }

    /// Number of queries served so far (failed attempts included).
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Let the next `n` queries succeed, then fail every one after that.
    pub fn fail_after(&self, n: usize) {
        *self.fail_after.lock().unwrap() = Some(n);
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn query(&self, query: EventQuery) -> Result<EventPage> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        {
            let mut fail_after = self.fail_after.lock().unwrap();
            if let Some(remaining) = fail_after.as_mut() {
                if *remaining == 0 {
                    return Err(Error::Repository("simulated repository outage".to_string()));
                }
                *remaining -= 1;
            }
        }

        let mut events: Vec<UsageEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches_filter(event, &query))
            .cloned()
            .collect();

        match query.order {
            SortOrder::TimestampAsc => {
                events.sort_by(|a, b| (a.timestamp, a.id).cmp(&(b.timestamp, b.id)))
            }
            SortOrder::TimestampDesc => {
                events.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)))
            }
        }

        if let Some(cursor) = query.cursor {
            if let Some(position) = events.iter().position(|event| event.id == cursor.event_id) {
                events.drain(..=position);
            } else {
                // Cursor row no longer present; resume strictly past its
                // timestamp in the requested order.
                events.retain(|event| match query.order {
                    SortOrder::TimestampAsc => event.timestamp > cursor.timestamp,
                    SortOrder::TimestampDesc => event.timestamp < cursor.timestamp,
                });
            }
        }

        let mut has_more = false;
        if let Some(limit) = query.limit {
            has_more = events.len() > limit;
            events.truncate(limit);
        }

        Ok(EventPage { events, has_more })
    }
}

fn matches_filter(event: &UsageEvent, query: &EventQuery) -> bool {
    let filter = &query.filter;
    if let Some(machine_id) = filter.machine_id.as_deref()
        && event.machine() != Some(machine_id)
    {
        return false;
    }
    if let Some(session_id) = filter.session_id.as_deref()
        && event.session() != Some(session_id)
    {
        return false;
    }
    if let Some(event_name) = filter.event_name.as_deref()
        && event.event_name != event_name
    {
        return false;
    }
    if let Some(since) = filter.since
        && event.timestamp < since
    {
        return false;
    }
    if let Some(until) = filter.until
        && event.timestamp >= until
    {
        return false;
    }
    true
}

/// License table backed by a plain vector.
#[derive(Default)]
pub struct InMemoryLicenseRepository {
    licenses: Mutex<Vec<License>>,
    calls: AtomicUsize,
    fail_next: AtomicBool,
}

impl InMemoryLicenseRepository {
    pub fn new(licenses: Vec<License>) -> Self {
        Self {
            licenses: Mutex::new(licenses),
            calls: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LicenseRepository for InMemoryLicenseRepository {
    async fn get_all(&self) -> Result<Vec<License>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::Repository("simulated license outage".to_string()));
        }
        Ok(self.licenses.lock().unwrap().clone())
    }
}

/// Usage-record feed backed by a plain vector.
#[derive(Default)]
pub struct InMemoryUsageRecordRepository {
    records: Mutex<Vec<UsageRecord>>,
    calls: AtomicUsize,
}

impl InMemoryUsageRecordRepository {
    pub fn new(records: Vec<UsageRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageRecordRepository for InMemoryUsageRecordRepository {
    async fn fetch_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<UsageRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.timestamp >= cutoff)
            .cloned()
            .collect())
    }
}
