//! Jobs shipped with the binary. Deployments embedding the library register
//! their own handlers on a [`JobRegistry`] instead.

use serde_json::json;

use joblease_core::{DomainResult, JobName};
use joblease_infra::{JobRegistry, LockConsole};

pub const NOOP_JOB: &str = "noop";
pub const LOCK_REPORT_JOB: &str = "lock-report";

pub fn builtin_registry(console: LockConsole) -> DomainResult<JobRegistry> {
    let mut registry = JobRegistry::new();

    // Exercises the trigger path end to end without side effects.
    registry.register(JobName::new(NOOP_JOB)?, || async { Ok(json!({ "ok": true })) });

    registry.register(JobName::new(LOCK_REPORT_JOB)?, move || {
        let console = console.clone();
        async move {
            let locks = console
                .list_lock_status()
                .await
                .map_err(|e| e.to_string())?;
            let held: Vec<String> = locks
                .iter()
                .filter(|s| s.locked)
                .map(|s| s.job_name.to_string())
                .collect();
            tracing::info!(held = held.len(), "lock report generated");
            Ok(json!({ "held": held }))
        }
    });

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use joblease_infra::InMemoryLeaseStore;

    use super::*;

    #[tokio::test]
    async fn builtin_jobs_are_registered_and_runnable() {
        let console = LockConsole::new(Arc::new(InMemoryLeaseStore::new()));
        let registry = builtin_registry(console).unwrap();

        assert_eq!(registry.len(), 2);
        let noop = registry.get(&JobName::new(NOOP_JOB).unwrap()).unwrap();
        assert_eq!(noop.start().await.unwrap(), json!({ "ok": true }));

        let report = registry.get(&JobName::new(LOCK_REPORT_JOB).unwrap()).unwrap();
        assert_eq!(report.start().await.unwrap(), json!({ "held": [] }));
    }
}
