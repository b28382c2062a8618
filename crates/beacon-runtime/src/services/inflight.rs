use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-key in-flight-fetch guard.
///
/// Overlapping cache misses for the same key serialize here: the first
/// caller fetches while the rest wait on the key's lock, then re-read the
/// freshly written entry instead of issuing duplicate repository reads.
/// The key set is small and fixed, so entries are kept for the lifetime of
/// the service.
#[derive(Default)]
pub(crate) struct InflightGuard {
    flights: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InflightGuard {
    pub(crate) async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let flight = {
            let mut flights = self.flights.lock().await;
            flights.entry(key.to_string()).or_default().clone()
        };
        flight.lock_owned().await
    }
}
