use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Shared handle to a lease store, as held by locks and their heartbeat tasks.
pub type SharedLeaseStore = Arc<dyn LeaseStore>;

/// Key-value store boundary used by the lease lock.
///
/// Every mutating method must be a single atomic operation on the store side.
/// Callers never compose a read with a write: ownership checks happen inside
/// `renew_if_owner` and `delete_if_owner`, not before them.
///
/// ## Operations
///
/// - `set_if_absent`: create `key = value` with a TTL, only if `key` is absent
/// - `renew_if_owner`: reset the TTL of `key`, only if it still holds `value`
/// - `delete_if_owner`: delete `key`, only if it still holds `value`
/// - `delete`: delete `key` unconditionally (operator path)
/// - `get` / `ttl`: diagnostics
/// - `keys_with_prefix`: enumerate a namespace
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Returns `true` if the key was created.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseStoreError>;

    /// Returns `true` if the key still held `value` and its TTL was reset.
    async fn renew_if_owner(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseStoreError>;

    /// Returns `true` if the key still held `value` and was deleted.
    async fn delete_if_owner(&self, key: &str, value: &str) -> Result<bool, LeaseStoreError>;

    /// Returns `true` if a key was deleted.
    async fn delete(&self, key: &str) -> Result<bool, LeaseStoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, LeaseStoreError>;

    /// Remaining time to live in whole seconds (rounded to nearest).
    /// `None` when the key is absent or carries no expiration.
    async fn ttl(&self, key: &str) -> Result<Option<u64>, LeaseStoreError>;

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LeaseStoreError>;
}

/// Lease store error.
#[derive(Debug, Clone, Error)]
pub enum LeaseStoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store command error: {0}")]
    Command(String),

    #[error("store script error: {0}")]
    Script(String),
}

/// Whole seconds, rounded to nearest, matching how Redis reports `TTL`.
pub(crate) fn round_secs(d: Duration) -> u64 {
    (d.as_millis() as u64 + 500) / 1000
}
