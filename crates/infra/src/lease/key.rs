//! Store key naming for leases.

use joblease_core::JobName;

/// Namespace shared by every lease key. Nothing else may be written under it.
pub const LEASE_KEY_PREFIX: &str = "joblease:lock:";

/// Store key holding the lease for `job_name`.
pub fn lease_key(job_name: &JobName) -> String {
    format!("{LEASE_KEY_PREFIX}{job_name}")
}

/// Recover the job name from a lease key, if `key` lies in the lease namespace.
pub fn job_name_from_key(key: &str) -> Option<JobName> {
    key.strip_prefix(LEASE_KEY_PREFIX)
        .and_then(|name| JobName::new(name).ok())
}
