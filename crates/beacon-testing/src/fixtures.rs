//! Fixture builders for events, usage records, and licenses.
//!
//! Fixtures anchor on a fixed base time so engine-level assertions are
//! reproducible; service-level tests that depend on the wall clock pass
//! their own timestamps through the builder instead.

use beacon_types::{
    EventType, LICENSE_KEY_DETAIL, License, LicenseStatus, SESSION_START_EVENT, UsageEvent,
    UsageRecord,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Fixed anchor so fixture data is reproducible across runs.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
}

/// Builder for a single usage event with sensible defaults.
pub struct EventBuilder {
    event: UsageEvent,
}

impl EventBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            event: UsageEvent {
                id: Uuid::new_v4(),
                machine_id: None,
                session_id: None,
                timestamp: base_time(),
                event_name: name.to_string(),
                event_type: EventType::Action,
                app_version: "1.4.0".to_string(),
                os: "windows".to_string(),
                details: serde_json::Map::new(),
            },
        }
    }

    pub fn machine(mut self, id: &str) -> Self {
        self.event.machine_id = Some(id.to_string());
        self
    }

    pub fn session(mut self, id: &str) -> Self {
        self.event.session_id = Some(id.to_string());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.event.timestamp = timestamp;
        self
    }

    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event.event_type = event_type;
        self
    }

    pub fn os(mut self, os: &str) -> Self {
        self.event.os = os.to_string();
        self
    }

    pub fn app_version(mut self, version: &str) -> Self {
        self.event.app_version = version.to_string();
        self
    }

    pub fn detail(mut self, key: &str, value: &str) -> Self {
        self.event
            .details
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn license_key(self, key: &str) -> Self {
        self.detail(LICENSE_KEY_DETAIL, key)
    }

    pub fn build(self) -> UsageEvent {
        self.event
    }
}

/// Shorthand for the common machine/session/offset case.
pub fn event(machine: &str, session: &str, name: &str, offset_secs: i64) -> UsageEvent {
    EventBuilder::new(name)
        .machine(machine)
        .session(session)
        .at(base_time() + Duration::seconds(offset_secs))
        .build()
}

/// A session-start lifecycle event.
pub fn session_start(machine: &str, session: &str, offset_secs: i64) -> UsageEvent {
    EventBuilder::new(SESSION_START_EVENT)
        .machine(machine)
        .session(session)
        .event_type(EventType::Lifecycle)
        .at(base_time() + Duration::seconds(offset_secs))
        .build()
}

/// An active license with a one-year runway.
pub fn license(key: &str, customer: &str, email: &str) -> License {
    License {
        key: key.to_string(),
        customer_name: customer.to_string(),
        customer_email: email.to_string(),
        status: LicenseStatus::Active,
        expires_at: base_time() + Duration::days(365),
        activated_at: Some(base_time() - Duration::days(30)),
    }
}

/// A per-launch usage ping.
pub fn usage_record(machine: &str, licensed: bool, timestamp: DateTime<Utc>) -> UsageRecord {
    UsageRecord {
        machine_id: machine.to_string(),
        is_licensed: licensed,
        timestamp,
    }
}
