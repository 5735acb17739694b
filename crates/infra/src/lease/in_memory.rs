use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::store::{LeaseStore, LeaseStoreError, round_secs};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory lease store.
///
/// Intended for tests/dev and single-process deployments. One mutex guards the
/// whole map, so every operation is linearizable. Expiry is lazy and measured
/// on the tokio clock, which lets tests drive lease timing with a paused clock.
#[derive(Debug, Default)]
pub struct InMemoryLeaseStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live entry for `key`, evicting it first if its deadline has passed.
fn live<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
    now: Instant,
) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|e| e.expires_at <= now) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseStoreError> {
        let now = Instant::now();
        let mut entries = self.entries();
        if live(&mut entries, key, now).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn renew_if_owner(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseStoreError> {
        let now = Instant::now();
        let mut entries = self.entries();
        match live(&mut entries, key, now) {
            Some(entry) if entry.value == value => {
                entry.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_if_owner(&self, key: &str, value: &str) -> Result<bool, LeaseStoreError> {
        let now = Instant::now();
        let mut entries = self.entries();
        let owned = live(&mut entries, key, now).is_some_and(|e| e.value == value);
        if owned {
            entries.remove(key);
        }
        Ok(owned)
    }

    async fn delete(&self, key: &str) -> Result<bool, LeaseStoreError> {
        let now = Instant::now();
        let mut entries = self.entries();
        let present = live(&mut entries, key, now).is_some();
        entries.remove(key);
        Ok(present)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, LeaseStoreError> {
        let now = Instant::now();
        let mut entries = self.entries();
        Ok(live(&mut entries, key, now).map(|e| e.value.clone()))
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, LeaseStoreError> {
        let now = Instant::now();
        let mut entries = self.entries();
        Ok(live(&mut entries, key, now).map(|e| round_secs(e.expires_at - now)))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LeaseStoreError> {
        let now = Instant::now();
        let mut entries = self.entries();
        entries.retain(|_, e| e.expires_at > now);
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
