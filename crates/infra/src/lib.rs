//! Infrastructure layer: lease stores, the job lock, supervision, config.

pub mod config;
pub mod console;
pub mod jobs;
pub mod lease;

pub use console::{LockConsole, LockStatus};
pub use jobs::{JobOutcome, JobRegistry, JobSupervisor};
pub use lease::{InMemoryLeaseStore, JobLock, LeaseStore, LeaseStoreError, LeaseWatch, SharedLeaseStore};
