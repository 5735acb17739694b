//! Lease-based mutual exclusion for scheduled jobs.
//!
//! ## Design
//!
//! - One store key per job name, under [`LEASE_KEY_PREFIX`]
//! - The key's value is a fresh owner token per acquisition
//! - The key's TTL is the only expiry mechanism; nothing computes deadlines locally
//! - Every store mutation is a single atomic operation (set-if-absent,
//!   compare-and-expire, compare-and-delete, or the operator's plain delete)
//!
//! ## Components
//!
//! - `LeaseStore`: atomic key-value operations the lock relies on
//! - `InMemoryLeaseStore`: single-process store for tests/dev
//! - `RedisLeaseStore`: shared store for multi-instance deployments (`redis` feature)
//! - `JobLock`: acquire / heartbeat / fenced release for one job name

pub mod in_memory;
pub mod key;
pub mod lock;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod store;
mod token;

pub use in_memory::InMemoryLeaseStore;
pub use key::{LEASE_KEY_PREFIX, job_name_from_key, lease_key};
pub use lock::{JobLock, LeaseWatch};
#[cfg(feature = "redis")]
pub use redis_store::RedisLeaseStore;
pub use store::{LeaseStore, LeaseStoreError, SharedLeaseStore};
