//! Job run outcomes.

use serde::Serialize;

use joblease_core::JobName;

/// Result of one supervised run that did not fail.
///
/// Serializes as `{"ran_status": "completed", "result": ...}` or
/// `{"ran_status": "skipped", "job_name": ..., "remaining_lease_seconds": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "ran_status", rename_all = "snake_case")]
pub enum JobOutcome<T> {
    /// The lease was acquired and the work ran to completion.
    Completed { result: T },
    /// Another invocation holds the lease; the work did not run.
    Skipped {
        job_name: JobName,
        /// `None` when the lease expired in the meantime or the TTL read failed.
        remaining_lease_seconds: Option<u64>,
    },
}

impl<T> JobOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, JobOutcome::Skipped { .. })
    }

    /// The work's value, if it ran.
    pub fn into_result(self) -> Option<T> {
        match self {
            JobOutcome::Completed { result } => Some(result),
            JobOutcome::Skipped { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> JobOutcome<U> {
        match self {
            JobOutcome::Completed { result } => JobOutcome::Completed { result: f(result) },
            JobOutcome::Skipped {
                job_name,
                remaining_lease_seconds,
            } => JobOutcome::Skipped {
                job_name,
                remaining_lease_seconds,
            },
        }
    }
}
