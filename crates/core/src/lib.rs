//! `joblease-core`: domain building blocks for the job lease lock.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod job_name;
pub mod lease_config;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use job_name::JobName;
pub use lease_config::{DEFAULT_LEASE_SECONDS, DEFAULT_RENEWAL_SECONDS, LeaseConfig};
pub use value_object::ValueObject;
