use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};

/// Pluggable key/value persistence for the cache layer.
///
/// Implementations store opaque strings; entry framing, TTL, and version
/// tags live in [`crate::CacheStore`]. Any backing store can be substituted
/// in tests.
pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
    /// Every key currently present, in no particular order.
    fn keys(&self) -> Result<Vec<String>>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for &B {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// Process-local backend; the default for embedded use and tests.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    /// When set, writes introducing a key beyond this count fail like a
    /// quota-exhausted store.
    capacity: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::ReadFailure("backend mutex poisoned".to_string()))
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;
        if let Some(capacity) = self.capacity
            && !entries.contains_key(key)
            && entries.len() >= capacity
        {
            return Err(Error::WriteFailure(format!(
                "storage quota exceeded ({} entries)",
                capacity
            )));
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
