use std::collections::{HashMap, HashSet};

use beacon_types::{License, LicenseAttribution, MachineSummary, UsageEvent};
use chrono::{DateTime, Utc};

use crate::diagnostics::IntegrityAnomaly;

/// Outcome of a catalog build: one summary per machine, newest activity
/// first, plus any license-join anomalies.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuild {
    pub machines: Vec<MachineSummary>,
    pub anomalies: Vec<IntegrityAnomaly>,
}

/// One page out of a materialized catalog.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub machines: Vec<MachineSummary>,
    pub offset: usize,
    pub total: usize,
    pub has_more: bool,
}

struct MachineDraft<'a> {
    last_activity: DateTime<Utc>,
    sessions: HashSet<&'a str>,
    app_version: &'a str,
    os: &'a str,
    events: Vec<&'a UsageEvent>,
}

/// Deduplicate events into one summary per machine and join license
/// attribution.
///
/// `last_activity` is the machine's newest event timestamp; `session_count`
/// counts distinct session ids; `app_version`/`os` come from the first
/// event observed for the machine, with empty values rendered `unknown`.
/// Events without a machine id are excluded.
///
/// The license join is deterministic: the machine's events are stably
/// sorted by timestamp and the earliest event whose `license_key` detail
/// matches the table wins. Later distinct matching keys are ignored and
/// reported as anomalies.
pub fn build_catalog(events: &[UsageEvent], licenses: &[License]) -> CatalogBuild {
    let by_key: HashMap<&str, &License> = licenses
        .iter()
        .map(|license| (license.key.as_str(), license))
        .collect();

    let mut drafts: HashMap<&str, MachineDraft> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for event in events {
        let Some(machine_id) = event.machine() else {
            continue;
        };
        let draft = drafts.entry(machine_id).or_insert_with(|| {
            order.push(machine_id);
            MachineDraft {
                last_activity: event.timestamp,
                sessions: HashSet::new(),
                app_version: event.app_version.as_str(),
                os: event.os.as_str(),
                events: Vec::new(),
            }
        });
        if event.timestamp > draft.last_activity {
            draft.last_activity = event.timestamp;
        }
        if let Some(session_id) = event.session() {
            draft.sessions.insert(session_id);
        }
        draft.events.push(event);
    }

    let mut anomalies = Vec::new();
    let mut machines = Vec::with_capacity(order.len());
    for machine_id in order {
        let Some(mut draft) = drafts.remove(machine_id) else {
            continue;
        };
        draft.events.sort_by_key(|event| event.timestamp);

        let mut attribution: Option<&License> = None;
        let mut ignored_keys: HashSet<&str> = HashSet::new();
        for event in &draft.events {
            let Some(key) = event.license_key() else {
                continue;
            };
            let Some(license) = by_key.get(key).copied() else {
                continue;
            };
            match attribution {
                None => attribution = Some(license),
                Some(kept) if kept.key != license.key => {
                    if ignored_keys.insert(key) {
                        anomalies.push(IntegrityAnomaly::ConflictingLicenseKeys {
                            machine_id: machine_id.to_string(),
                            kept: kept.key.clone(),
                            ignored: license.key.clone(),
                        });
                    }
                }
                Some(_) => {}
            }
        }

        machines.push(MachineSummary {
            machine_id: machine_id.to_string(),
            last_activity: draft.last_activity,
            session_count: draft.sessions.len(),
            app_version: fallback(draft.app_version),
            os: fallback(draft.os),
            license: attribution.map(|license| LicenseAttribution {
                key: license.key.clone(),
                customer_name: license.customer_name.clone(),
                customer_email: license.customer_email.clone(),
                status: license.status,
            }),
        });
    }

    // Newest activity first; the sort is stable, so equal timestamps keep
    // first-appearance order.
    machines.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));

    CatalogBuild {
        machines,
        anomalies,
    }
}

/// Slice one page out of the materialized catalog.
///
/// The full set must already be built (or cached) before the first page;
/// there is no server-side cursor for this view.
pub fn page_catalog(catalog: &[MachineSummary], offset: usize, page_size: usize) -> CatalogPage {
    let start = offset.min(catalog.len());
    let end = start.saturating_add(page_size).min(catalog.len());
    CatalogPage {
        machines: catalog[start..end].to_vec(),
        offset: start,
        total: catalog.len(),
        has_more: end < catalog.len(),
    }
}

fn fallback(raw: &str) -> String {
    if raw.is_empty() {
        "unknown".to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::{EventType, LICENSE_KEY_DETAIL, LicenseStatus};
    use chrono::{Duration, TimeZone};
    use serde_json::Value;
    use uuid::Uuid;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
    }

    fn event(machine: &str, session: &str, offset_secs: i64) -> UsageEvent {
        UsageEvent {
            id: Uuid::new_v4(),
            machine_id: Some(machine.to_string()),
            session_id: Some(session.to_string()),
            timestamp: base() + Duration::seconds(offset_secs),
            event_name: "button_click".to_string(),
            event_type: EventType::Action,
            app_version: "1.4.0".to_string(),
            os: "windows".to_string(),
            details: serde_json::Map::new(),
        }
    }

    fn keyed_event(machine: &str, session: &str, offset_secs: i64, key: &str) -> UsageEvent {
        let mut event = event(machine, session, offset_secs);
        event
            .details
            .insert(LICENSE_KEY_DETAIL.to_string(), Value::String(key.to_string()));
        event
    }

    fn license(key: &str) -> License {
        License {
            key: key.to_string(),
            customer_name: format!("Customer {}", key),
            customer_email: format!("{}@example.com", key.to_lowercase()),
            status: LicenseStatus::Active,
            expires_at: base() + Duration::days(365),
            activated_at: Some(base() - Duration::days(30)),
        }
    }

    #[test]
    fn test_one_summary_per_machine() {
        let events = vec![
            event("A", "S1", 0),
            event("A", "S1", 30),
            event("A", "S2", 400),
            event("B", "S3", 200),
        ];

        let build = build_catalog(&events, &[]);
        assert_eq!(build.machines.len(), 2);

        let a = build.machines.iter().find(|m| m.machine_id == "A").unwrap();
        assert_eq!(a.session_count, 2);
        assert_eq!(a.last_activity, base() + Duration::seconds(400));
        assert_eq!(a.app_version, "1.4.0");
        assert_eq!(a.os, "windows");
    }

    #[test]
    fn test_sorted_by_last_activity_descending() {
        let events = vec![
            event("A", "S1", 0),
            event("B", "S2", 500),
            event("C", "S3", 200),
        ];

        let build = build_catalog(&events, &[]);
        let ids: Vec<&str> = build.machines.iter().map(|m| m.machine_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_machineless_events_excluded() {
        let mut orphan = event("A", "S1", 0);
        orphan.machine_id = None;
        let build = build_catalog(&[orphan, event("B", "S2", 10)], &[]);
        assert_eq!(build.machines.len(), 1);
        assert_eq!(build.machines[0].machine_id, "B");
    }

    #[test]
    fn test_first_matching_license_wins() {
        let licenses = vec![license("K1"), license("K2")];
        let events = vec![
            keyed_event("C", "S1", 0, "K1"),
            keyed_event("C", "S1", 60, "K2"),
        ];

        let build = build_catalog(&events, &licenses);
        let machine = &build.machines[0];
        let attribution = machine.license.as_ref().unwrap();
        assert_eq!(attribution.key, "K1");
        assert_eq!(attribution.customer_name, "Customer K1");

        // The ignored second key is reported, once.
        assert_eq!(
            build.anomalies,
            vec![IntegrityAnomaly::ConflictingLicenseKeys {
                machine_id: "C".to_string(),
                kept: "K1".to_string(),
                ignored: "K2".to_string(),
            }]
        );
    }

    #[test]
    fn test_join_order_is_timestamp_not_input_order() {
        let licenses = vec![license("K1"), license("K2")];
        // K2 appears first in input order but later in time; K1 must win.
        let events = vec![
            keyed_event("C", "S1", 60, "K2"),
            keyed_event("C", "S1", 0, "K1"),
        ];

        let build = build_catalog(&events, &licenses);
        assert_eq!(build.machines[0].license.as_ref().unwrap().key, "K1");
    }

    #[test]
    fn test_unmatched_key_leaves_machine_unlicensed() {
        let events = vec![keyed_event("C", "S1", 0, "NOPE")];
        let build = build_catalog(&events, &[license("K1")]);
        assert!(build.machines[0].license.is_none());
        assert!(build.anomalies.is_empty());
    }

    #[test]
    fn test_unknown_fallback_for_blank_fields() {
        let mut bare = event("A", "S1", 0);
        bare.app_version = String::new();
        bare.os = String::new();

        let build = build_catalog(&[bare], &[]);
        assert_eq!(build.machines[0].app_version, "unknown");
        assert_eq!(build.machines[0].os, "unknown");
    }

    #[test]
    fn test_pagination_over_materialized_list() {
        let events: Vec<UsageEvent> = (0..5)
            .map(|i| event(&format!("M{}", i), "S", i * 10))
            .collect();
        let build = build_catalog(&events, &[]);

        let first = page_catalog(&build.machines, 0, 2);
        assert_eq!(first.machines.len(), 2);
        assert_eq!(first.total, 5);
        assert!(first.has_more);
        assert_eq!(first.machines[0].machine_id, "M4");

        let last = page_catalog(&build.machines, 4, 2);
        assert_eq!(last.machines.len(), 1);
        assert!(!last.has_more);

        let past_end = page_catalog(&build.machines, 10, 2);
        assert!(past_end.machines.is_empty());
        assert!(!past_end.has_more);
    }
}
