//! Lease timing configuration.

use std::time::Duration;

use serde::Serialize;

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Default lease TTL, in seconds.
pub const DEFAULT_LEASE_SECONDS: u64 = 300;

/// Default heartbeat cadence, in seconds (5:1 against the lease).
pub const DEFAULT_RENEWAL_SECONDS: u64 = 60;

/// TTL and heartbeat cadence for one job's lease.
///
/// Always constructed through [`LeaseConfig::new`], so every instance satisfies
/// `0 < renewal_interval < lease_duration`. A lease outside that range could
/// never renew itself before the store evicts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeaseConfig {
    lease_seconds: u64,
    renewal_seconds: u64,
}

impl LeaseConfig {
    pub fn new(lease_seconds: u64, renewal_seconds: u64) -> DomainResult<Self> {
        if lease_seconds == 0 {
            return Err(DomainError::validation("lease duration must be positive"));
        }
        if renewal_seconds == 0 {
            return Err(DomainError::validation("renewal interval must be positive"));
        }
        if renewal_seconds >= lease_seconds {
            return Err(DomainError::validation(format!(
                "renewal interval ({renewal_seconds}s) must be shorter than lease duration ({lease_seconds}s)"
            )));
        }

        Ok(Self {
            lease_seconds,
            renewal_seconds,
        })
    }

    /// Apply per-call overrides on top of `self`, re-validating the result.
    pub fn with_overrides(
        &self,
        lease_seconds: Option<u64>,
        renewal_seconds: Option<u64>,
    ) -> DomainResult<Self> {
        Self::new(
            lease_seconds.unwrap_or(self.lease_seconds),
            renewal_seconds.unwrap_or(self.renewal_seconds),
        )
    }

    pub fn lease_seconds(&self) -> u64 {
        self.lease_seconds
    }

    pub fn renewal_seconds(&self) -> u64 {
        self.renewal_seconds
    }

    pub fn lease_duration(&self) -> Duration {
        Duration::from_secs(self.lease_seconds)
    }

    pub fn renewal_interval(&self) -> Duration {
        Duration::from_secs(self.renewal_seconds)
    }
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            lease_seconds: DEFAULT_LEASE_SECONDS,
            renewal_seconds: DEFAULT_RENEWAL_SECONDS,
        }
    }
}

impl ValueObject for LeaseConfig {}
