use std::sync::Arc;

use beacon_engine::{
    CatalogPage, IntegrityAnomaly, Reconstruction, StatWindows, build_catalog, compute_snapshot,
    page_catalog, quick_stats, reconstruct_sessions,
};
use beacon_store::{CacheStore, KeyValueBackend, keys};
use beacon_types::{License, QuickStats, StatsSnapshot, UsageEvent};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;

use super::inflight::InflightGuard;
use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::repository::{
    EventFilter, EventQuery, EventRepository, LicenseRepository, SortOrder, UsageRecordRepository,
    fetch_all_events,
};

/// Cached view builds over the event log: quick usage overview,
/// comprehensive statistics, machine catalog pages, and per-machine
/// drill-downs.
///
/// Repository failures abort the build and propagate; callers that prefer
/// zero-valued metrics recover with `unwrap_or_default()`. Integrity
/// anomalies and cache write failures are logged, never fatal. The cache is
/// the only shared mutable resource; everything else is local to one call.
pub struct AnalyticsService<B: KeyValueBackend> {
    events: Arc<dyn EventRepository>,
    licenses: Arc<dyn LicenseRepository>,
    usage: Arc<dyn UsageRecordRepository>,
    cache: CacheStore<B>,
    config: AnalyticsConfig,
    inflight: InflightGuard,
}

impl<B: KeyValueBackend> AnalyticsService<B> {
    pub fn new(
        events: Arc<dyn EventRepository>,
        licenses: Arc<dyn LicenseRepository>,
        usage: Arc<dyn UsageRecordRepository>,
        cache: CacheStore<B>,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            events,
            licenses,
            usage,
            cache,
            config,
            inflight: InflightGuard::default(),
        }
    }

    /// Quick counters over the trailing usage-record window.
    pub async fn usage_overview(&self) -> Result<QuickStats> {
        if let Some(stats) = self.cache.get(keys::USAGE_STATS) {
            return Ok(stats);
        }
        let _flight = self.inflight.acquire(keys::USAGE_STATS).await;
        if let Some(stats) = self.cache.get(keys::USAGE_STATS) {
            return Ok(stats);
        }

        let now = Utc::now();
        let cutoff = now - Duration::days(self.config.usage_window_days);
        let records = self.usage.fetch_since(cutoff).await?;
        let stats = quick_stats(&records, StatWindows::at(now).today_start);
        self.cache_write(keys::USAGE_STATS, &stats);
        Ok(stats)
    }

    /// Full snapshot: reconstruction plus aggregation over the whole log.
    pub async fn comprehensive_stats(&self) -> Result<StatsSnapshot> {
        if let Some(snapshot) = self.cache.get(keys::COMPREHENSIVE_STATS) {
            return Ok(snapshot);
        }
        let _flight = self.inflight.acquire(keys::COMPREHENSIVE_STATS).await;
        if let Some(snapshot) = self.cache.get(keys::COMPREHENSIVE_STATS) {
            return Ok(snapshot);
        }

        let events = self.cached_events().await?;
        let now = Utc::now();
        let reconstruction = reconstruct_sessions(&events, self.detail_window_start(now));
        self.log_anomalies(&reconstruction.anomalies);

        let snapshot = compute_snapshot(&events, &reconstruction.sessions, &StatWindows::at(now));
        self.cache_write(keys::COMPREHENSIVE_STATS, &snapshot);
        Ok(snapshot)
    }

    /// One catalog page, newest activity first. The full event set and the
    /// license table are fetched together before the first page; pagination
    /// then slices the materialized list.
    pub async fn machine_catalog(&self, offset: usize, page_size: usize) -> Result<CatalogPage> {
        let (events, licenses) = tokio::try_join!(self.cached_events(), self.cached_licenses())?;

        let build = build_catalog(&events, &licenses);
        self.log_anomalies(&build.anomalies);
        Ok(page_catalog(&build.machines, offset, page_size))
    }

    /// Sessions for one machine, newest first. Served straight from the
    /// repository filter; the slice is machine-local and small, so every
    /// session gets full detail.
    pub async fn machine_sessions(&self, machine_id: &str) -> Result<Reconstruction> {
        let page = self
            .events
            .query(EventQuery {
                filter: EventFilter {
                    machine_id: Some(machine_id.to_string()),
                    ..Default::default()
                },
                order: SortOrder::TimestampDesc,
                limit: None,
                cursor: None,
            })
            .await?;

        let reconstruction = reconstruct_sessions(&page.events, DateTime::<Utc>::MIN_UTC);
        self.log_anomalies(&reconstruction.anomalies);
        Ok(reconstruction)
    }

    /// Ascending event timeline for one session on one machine.
    pub async fn session_events(
        &self,
        machine_id: &str,
        session_id: &str,
    ) -> Result<Vec<UsageEvent>> {
        let page = self
            .events
            .query(EventQuery {
                filter: EventFilter {
                    machine_id: Some(machine_id.to_string()),
                    session_id: Some(session_id.to_string()),
                    ..Default::default()
                },
                order: SortOrder::TimestampAsc,
                limit: None,
                cursor: None,
            })
            .await?;
        Ok(page.events)
    }

    /// Drop every cached view; the next request recomputes from the
    /// repositories.
    pub fn force_refresh(&self) {
        if let Err(err) = self.cache.invalidate_all() {
            warn!("cache refresh failed: {}", err);
        }
    }

    async fn cached_events(&self) -> Result<Vec<UsageEvent>> {
        if let Some(events) = self.cache.get(keys::USER_EVENTS) {
            return Ok(events);
        }
        let _flight = self.inflight.acquire(keys::USER_EVENTS).await;
        if let Some(events) = self.cache.get(keys::USER_EVENTS) {
            return Ok(events);
        }

        let events = fetch_all_events(
            self.events.as_ref(),
            EventFilter::default(),
            SortOrder::TimestampAsc,
            self.config.fetch_page_size,
        )
        .await?;
        self.cache_write(keys::USER_EVENTS, &events);
        Ok(events)
    }

    async fn cached_licenses(&self) -> Result<Vec<License>> {
        if let Some(licenses) = self.cache.get(keys::LICENSES) {
            return Ok(licenses);
        }
        let _flight = self.inflight.acquire(keys::LICENSES).await;
        if let Some(licenses) = self.cache.get(keys::LICENSES) {
            return Ok(licenses);
        }

        let licenses = self.licenses.get_all().await?;
        self.cache_write(keys::LICENSES, &licenses);
        Ok(licenses)
    }

    fn detail_window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(self.config.detail_window_hours)
    }

    fn cache_write<T: Serialize>(&self, key: &str, value: &T) {
        // A failed write already wiped the store as recovery; the freshly
        // computed value still goes back to the caller.
        if let Err(err) = self.cache.set(key, value) {
            warn!("cache write for {} failed: {}", key, err);
        }
    }

    fn log_anomalies(&self, anomalies: &[IntegrityAnomaly]) {
        for anomaly in anomalies {
            warn!("integrity anomaly: {}", anomaly);
        }
    }
}
