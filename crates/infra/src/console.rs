//! Operator-facing lease introspection and recovery.
//!
//! Nothing here takes part in acquisition decisions. `list_lock_status` is a
//! point-in-time snapshot; `force_release` bypasses ownership fencing and is
//! meant for a human who has confirmed the holder is gone.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use joblease_core::JobName;

use crate::lease::{LEASE_KEY_PREFIX, LeaseStoreError, SharedLeaseStore, job_name_from_key, lease_key};

/// Snapshot of one job's lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    pub job_name: JobName,
    pub locked: bool,
    pub remaining_lease_seconds: Option<u64>,
    pub observed_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct LockConsole {
    store: SharedLeaseStore,
}

impl LockConsole {
    pub fn new(store: SharedLeaseStore) -> Self {
        Self { store }
    }

    /// Delete the lease for `job_name` regardless of who holds it.
    ///
    /// Returns `true` if a lease was removed. If the previous holder is in fact
    /// still running, a new holder can now run alongside it.
    pub async fn force_release(&self, job_name: &JobName) -> Result<bool, LeaseStoreError> {
        let removed = self.store.delete(&lease_key(job_name)).await?;
        if removed {
            warn!(
                job_name = %job_name,
                "lease force-released by operator; ownership check bypassed"
            );
        } else {
            info!(job_name = %job_name, "force release requested but no lease was present");
        }
        Ok(removed)
    }

    /// Current state of one job's lease.
    pub async fn lock_status(&self, job_name: &JobName) -> Result<LockStatus, LeaseStoreError> {
        let key = lease_key(job_name);
        let locked = self.store.get(&key).await?.is_some();
        let remaining_lease_seconds = if locked { self.store.ttl(&key).await? } else { None };

        Ok(LockStatus {
            job_name: job_name.clone(),
            locked,
            remaining_lease_seconds,
            observed_at: Utc::now(),
        })
    }

    /// Every lease currently present in the lease namespace, sorted by job name.
    ///
    /// A lease that expires between enumeration and inspection is reported with
    /// `locked: false`.
    pub async fn list_lock_status(&self) -> Result<Vec<LockStatus>, LeaseStoreError> {
        let keys = self.store.keys_with_prefix(LEASE_KEY_PREFIX).await?;

        let mut names: Vec<JobName> = Vec::with_capacity(keys.len());
        for key in &keys {
            match job_name_from_key(key) {
                Some(name) => names.push(name),
                None => warn!(key = %key, "ignoring malformed key in lease namespace"),
            }
        }
        names.sort();

        let mut statuses = Vec::with_capacity(names.len());
        for name in &names {
            statuses.push(self.lock_status(name).await?);
        }
        Ok(statuses)
    }
}

impl std::fmt::Debug for LockConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockConsole").finish_non_exhaustive()
    }
}
