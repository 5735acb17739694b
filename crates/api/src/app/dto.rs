use serde::{Deserialize, Serialize};

use joblease_core::{JobName, LeaseConfig};
use joblease_infra::LockStatus;

// -------------------------
// Request DTOs
// -------------------------

/// Optional per-invocation lease overrides for `POST /jobs/:job_name/run`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunJobRequest {
    pub lease_duration_seconds: Option<u64>,
    pub renewal_interval_seconds: Option<u64>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct RegisteredJobResponse {
    pub job_name: JobName,
    pub lease_duration_seconds: u64,
    pub renewal_interval_seconds: u64,
}

impl RegisteredJobResponse {
    pub fn new(job_name: JobName, config: LeaseConfig) -> Self {
        Self {
            job_name,
            lease_duration_seconds: config.lease_seconds(),
            renewal_interval_seconds: config.renewal_seconds(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LockListResponse {
    pub count: usize,
    pub locks: Vec<LockStatus>,
}

#[derive(Debug, Serialize)]
pub struct ForceReleaseResponse {
    pub job_name: JobName,
    pub released: bool,
}
