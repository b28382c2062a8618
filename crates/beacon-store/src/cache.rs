use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::backend::KeyValueBackend;
use crate::error::{Error, Result};

/// Reserved backend key holding the store-wide version tag.
const VERSION_TAG_KEY: &str = "cache_schema_version";

/// Fixed logical cache keys shared by the view builds.
pub mod keys {
    pub const USER_EVENTS: &str = "user_events";
    pub const USAGE_STATS: &str = "usage_stats";
    pub const LICENSES: &str = "licenses";
    pub const COMPREHENSIVE_STATS: &str = "comprehensive_stats";
}

/// Stored entry envelope: the cached payload plus the freshness metadata
/// that decides whether it may still be served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub stored_at_millis: i64,
    pub version_tag: String,
    pub payload: serde_json::Value,
}

impl CacheEntry {
    /// An entry is served only while no older than the TTL and tagged with
    /// the running version.
    pub fn is_valid(&self, now_millis: i64, ttl_millis: i64, version_tag: &str) -> bool {
        now_millis - self.stored_at_millis <= ttl_millis && self.version_tag == version_tag
    }
}

/// Time-bounded, version-tagged cache over an injected key/value backend.
///
/// One fixed TTL covers the whole store and invalidation granularity is the
/// whole entry. `get` fails open: an absent, expired, corrupt, or
/// mistagged entry is a miss, never an error the caller sees.
pub struct CacheStore<B: KeyValueBackend> {
    backend: B,
    version_tag: String,
    ttl: Duration,
}

impl<B: KeyValueBackend> CacheStore<B> {
    /// Open the store and run the version handshake: when the tag persisted
    /// in the backend differs from `version_tag`, every existing entry is
    /// wiped once and the new tag is stored. Payloads shaped by a previous
    /// schema can therefore never reach a newer aggregator.
    pub fn open(backend: B, version_tag: impl Into<String>, ttl: Duration) -> Result<Self> {
        let store = Self {
            backend,
            version_tag: version_tag.into(),
            ttl,
        };
        let stored = store.backend.get(VERSION_TAG_KEY)?;
        if stored.as_deref() != Some(store.version_tag.as_str()) {
            store.invalidate_all()?;
            store.backend.set(VERSION_TAG_KEY, &store.version_tag)?;
        }
        Ok(store)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now())
    }

    /// Clock-explicit variant of [`CacheStore::get`]. Expired entries are
    /// removed from the backend on the way out.
    pub fn get_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let raw = self.backend.get(key).ok().flatten()?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(_) => {
                // Fail open: a corrupt entry is a miss, never the caller's
                // problem. Drop it so the next write starts clean.
                let _ = self.backend.delete(key);
                return None;
            }
        };
        if !entry.is_valid(
            now.timestamp_millis(),
            self.ttl.num_milliseconds(),
            &self.version_tag,
        ) {
            let _ = self.backend.delete(key);
            return None;
        }
        serde_json::from_value(entry.payload).ok()
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_at(key, value, Utc::now())
    }

    /// Clock-explicit variant of [`CacheStore::set`].
    ///
    /// A failed backend write (storage quota exhaustion and the like) wipes
    /// the store as recovery; the value is simply not cached this cycle and
    /// the error is returned so callers can log it. No retry.
    pub fn set_at<T: Serialize>(&self, key: &str, value: &T, now: DateTime<Utc>) -> Result<()> {
        let entry = CacheEntry {
            stored_at_millis: now.timestamp_millis(),
            version_tag: self.version_tag.clone(),
            payload: serde_json::to_value(value)
                .map_err(|err| Error::WriteFailure(err.to_string()))?,
        };
        let raw =
            serde_json::to_string(&entry).map_err(|err| Error::WriteFailure(err.to_string()))?;
        if let Err(err) = self.backend.set(key, &raw) {
            let _ = self.invalidate_all();
            return Err(err);
        }
        Ok(())
    }

    pub fn invalidate(&self, key: &str) -> Result<()> {
        self.backend.delete(key)
    }

    /// Remove every cached entry. The version tag itself survives so the
    /// handshake does not re-trigger on the next open.
    pub fn invalidate_all(&self) -> Result<()> {
        for key in self.backend.keys()? {
            if key != VERSION_TAG_KEY {
                self.backend.delete(&key)?;
            }
        }
        Ok(())
    }

    pub fn version_tag(&self) -> &str {
        &self.version_tag
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn ttl_minutes(minutes: i64) -> Duration {
        Duration::minutes(minutes)
    }

    #[test]
    fn test_round_trip() {
        let store = CacheStore::open(MemoryBackend::new(), "v1", ttl_minutes(60)).unwrap();
        store.set(keys::USAGE_STATS, &vec![1u64, 2, 3]).unwrap();

        let cached: Option<Vec<u64>> = store.get(keys::USAGE_STATS);
        assert_eq!(cached, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_ttl_expiry_removes_entry() {
        let store = CacheStore::open(MemoryBackend::new(), "v1", ttl_minutes(60)).unwrap();
        let t0 = Utc::now();
        store.set_at(keys::USAGE_STATS, &"payload", t0).unwrap();

        // Still valid right at the TTL boundary.
        let at_limit: Option<String> = store.get_at(keys::USAGE_STATS, t0 + ttl_minutes(60));
        assert_eq!(at_limit, Some("payload".to_string()));

        // Re-store, then read one minute past the TTL: miss, entry gone.
        store.set_at(keys::USAGE_STATS, &"payload", t0).unwrap();
        let expired: Option<String> = store.get_at(keys::USAGE_STATS, t0 + ttl_minutes(61));
        assert_eq!(expired, None);
        assert_eq!(store.backend().get(keys::USAGE_STATS).unwrap(), None);
    }

    #[test]
    fn test_version_mismatch_clears_everything_once() {
        let backend = MemoryBackend::new();
        {
            let store = CacheStore::open(&backend, "v1", ttl_minutes(60)).unwrap();
            store.set(keys::USER_EVENTS, &"events").unwrap();
            store.set(keys::LICENSES, &"licenses").unwrap();
        }

        // New build, new tag: the old entries must all be gone.
        let store = CacheStore::open(&backend, "v2", ttl_minutes(60)).unwrap();
        assert_eq!(store.get::<String>(keys::USER_EVENTS), None);
        assert_eq!(store.get::<String>(keys::LICENSES), None);

        // Only the version tag remains in the backend.
        assert_eq!(backend.len(), 1);

        // Re-opening with the same tag leaves fresh entries alone.
        store.set(keys::USER_EVENTS, &"fresh").unwrap();
        let reopened = CacheStore::open(&backend, "v2", ttl_minutes(60)).unwrap();
        assert_eq!(
            reopened.get::<String>(keys::USER_EVENTS),
            Some("fresh".to_string())
        );
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let backend = MemoryBackend::new();
        let store = CacheStore::open(&backend, "v1", ttl_minutes(60)).unwrap();

        backend.set(keys::USAGE_STATS, "not json at all").unwrap();
        assert_eq!(store.get::<String>(keys::USAGE_STATS), None);

        // The corrupt entry was dropped.
        assert_eq!(backend.get(keys::USAGE_STATS).unwrap(), None);
    }

    #[test]
    fn test_mistagged_entry_is_a_miss() {
        let backend = MemoryBackend::new();
        let store = CacheStore::open(&backend, "v1", ttl_minutes(60)).unwrap();

        let foreign = CacheEntry {
            stored_at_millis: Utc::now().timestamp_millis(),
            version_tag: "v0".to_string(),
            payload: serde_json::Value::String("stale".to_string()),
        };
        backend
            .set(keys::USAGE_STATS, &serde_json::to_string(&foreign).unwrap())
            .unwrap();

        assert_eq!(store.get::<String>(keys::USAGE_STATS), None);
    }

    #[test]
    fn test_write_failure_wipes_and_reports() {
        // Room for the version tag plus exactly one entry.
        let backend = MemoryBackend::with_capacity_limit(2);
        let store = CacheStore::open(&backend, "v1", ttl_minutes(60)).unwrap();

        store.set(keys::USER_EVENTS, &"events").unwrap();
        let err = store.set(keys::LICENSES, &"licenses").unwrap_err();
        assert!(matches!(err, Error::WriteFailure(_)));

        // Recovery wiped the cached entries; the version tag survives.
        assert_eq!(store.get::<String>(keys::USER_EVENTS), None);
        assert_eq!(backend.len(), 1);

        // The store keeps working after recovery.
        store.set(keys::LICENSES, &"licenses").unwrap();
        assert_eq!(
            store.get::<String>(keys::LICENSES),
            Some("licenses".to_string())
        );
    }

    #[test]
    fn test_explicit_invalidation() {
        let store = CacheStore::open(MemoryBackend::new(), "v1", ttl_minutes(60)).unwrap();
        store.set(keys::USER_EVENTS, &"events").unwrap();
        store.set(keys::LICENSES, &"licenses").unwrap();

        store.invalidate(keys::USER_EVENTS).unwrap();
        assert_eq!(store.get::<String>(keys::USER_EVENTS), None);
        assert_eq!(
            store.get::<String>(keys::LICENSES),
            Some("licenses".to_string())
        );

        store.invalidate_all().unwrap();
        assert_eq!(store.get::<String>(keys::LICENSES), None);
    }
}
