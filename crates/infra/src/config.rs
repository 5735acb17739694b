//! Configuration loading and representation.
//!
//! Settings come from environment variables, read once at startup:
//!
//! | Variable | Default |
//! |---|---|
//! | `JOBLEASE_STORE` | `memory` (`memory` or `redis`) |
//! | `REDIS_URL` | `redis://localhost:6379` |
//! | `JOBLEASE_LEASE_SECONDS` | `300` |
//! | `JOBLEASE_RENEWAL_SECONDS` | `60` |
//! | `JOBLEASE_CRON_SECRET` | none (callers fall back to a dev secret) |
//! | `JOBLEASE_BIND_ADDR` | `0.0.0.0:8080` |

use std::str::FromStr;

use thiserror::Error;

use joblease_core::{DEFAULT_LEASE_SECONDS, DEFAULT_RENEWAL_SECONDS, DomainError, LeaseConfig};

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("lease settings: {0}")]
    Lease(#[from] DomainError),
}

/// Which lease store backs the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local; only correct when a single instance runs.
    Memory,
    /// Shared Redis; required for multi-instance deployments.
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown store backend {other:?}; expected memory or redis")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: StoreBackend,
    pub redis_url: String,
    pub lease: LeaseConfig,
    pub cron_secret: Option<String>,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let store = match get("JOBLEASE_STORE") {
            Some(v) => v.parse().map_err(|message| ConfigError::Invalid {
                var: "JOBLEASE_STORE",
                message,
            })?,
            None => StoreBackend::Memory,
        };

        let lease_seconds = parse_secs(get("JOBLEASE_LEASE_SECONDS"), "JOBLEASE_LEASE_SECONDS")?
            .unwrap_or(DEFAULT_LEASE_SECONDS);
        let renewal_seconds =
            parse_secs(get("JOBLEASE_RENEWAL_SECONDS"), "JOBLEASE_RENEWAL_SECONDS")?
                .unwrap_or(DEFAULT_RENEWAL_SECONDS);

        Ok(Self {
            store,
            redis_url: get("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            lease: LeaseConfig::new(lease_seconds, renewal_seconds)?,
            cron_secret: get("JOBLEASE_CRON_SECRET"),
            bind_addr: get("JOBLEASE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

fn parse_secs(raw: Option<String>, var: &'static str) -> Result<Option<u64>, ConfigError> {
    raw.map(|v| {
        v.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
            var,
            message: format!("expected whole seconds, got {v:?} ({e})"),
        })
    })
    .transpose()
}
