//! Supervised execution of recurring jobs.
//!
//! ## Design
//!
//! - At most one running instance per job name, cluster-wide, via `JobLock`
//! - Contention is an expected outcome (`Skipped`), not an error
//! - Job failures are propagated unchanged after the lease is released
//! - No retries here; the external scheduler's next tick is the retry
//!
//! ## Components
//!
//! - `JobSupervisor`: acquire → run → release around a unit of work
//! - `JobOutcome`: completed / skipped result of a supervised run
//! - `JobRegistry`: named job bodies for the HTTP trigger

pub mod registry;
pub mod supervisor;
pub mod types;

pub use registry::{JobFuture, JobHandler, JobRegistry, RegisteredJob};
pub use supervisor::JobSupervisor;
pub use types::JobOutcome;
