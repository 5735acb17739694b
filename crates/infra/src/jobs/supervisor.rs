//! Runs a unit of work under a job's lease.

use std::fmt::Display;
use std::future::Future;

use chrono::Utc;
use tracing::{info, warn};

use joblease_core::{JobName, LeaseConfig};

use super::types::JobOutcome;
use crate::lease::{JobLock, LeaseWatch, SharedLeaseStore};

/// Cluster-wide "at most one running instance" wrapper for job bodies.
///
/// Each call builds a fresh [`JobLock`], so every attempt gets its own owner
/// token. Contention is not an error: it yields [`JobOutcome::Skipped`]. A
/// failing job body is never retried here; the lease is released before the
/// error is handed back so the next scheduled tick can try again.
#[derive(Clone)]
pub struct JobSupervisor {
    store: SharedLeaseStore,
    defaults: LeaseConfig,
}

impl JobSupervisor {
    pub fn new(store: SharedLeaseStore, defaults: LeaseConfig) -> Self {
        Self { store, defaults }
    }

    pub fn defaults(&self) -> LeaseConfig {
        self.defaults
    }

    /// Run `work` if the lease for `job_name` can be taken.
    ///
    /// `config` overrides the supervisor defaults for this job.
    pub async fn run<T, E, F, Fut>(
        &self,
        job_name: &JobName,
        config: Option<LeaseConfig>,
        work: F,
    ) -> Result<JobOutcome<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_with_lease(job_name, config, |_| work()).await
    }

    /// Like [`JobSupervisor::run`], but hands the work a [`LeaseWatch`] so it
    /// can notice a takeover and stop early. The supervisor never interrupts
    /// the work on its own.
    pub async fn run_with_lease<T, E, F, Fut>(
        &self,
        job_name: &JobName,
        config: Option<LeaseConfig>,
        work: F,
    ) -> Result<JobOutcome<T>, E>
    where
        F: FnOnce(LeaseWatch) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let config = config.unwrap_or(self.defaults);
        let mut lock = JobLock::new(self.store.clone(), job_name.clone(), config);

        let acquired = lock.acquire().await;
        let watch = match lock.lease_watch() {
            Some(watch) if acquired => watch,
            _ => return Ok(skipped(&lock).await),
        };

        let started = Utc::now();
        info!(job_name = %job_name, "job started");

        // If this future is dropped mid-work (caller timeout, disconnected
        // client, panicking work), dropping `lock` stops the heartbeat and
        // schedules the fenced delete.
        let result = work(watch).await;
        lock.release().await;

        let duration_ms = (Utc::now() - started).num_milliseconds().max(0);
        match result {
            Ok(value) => {
                info!(job_name = %job_name, duration_ms, "job completed");
                Ok(JobOutcome::Completed { result: value })
            }
            Err(e) => {
                warn!(job_name = %job_name, duration_ms, error = %e, "job failed; lease released");
                Err(e)
            }
        }
    }
}

async fn skipped<T>(lock: &JobLock) -> JobOutcome<T> {
    let job_name = lock.job_name();
    let remaining_lease_seconds = match lock.remaining_lease().await {
        Ok(ttl) => ttl,
        Err(e) => {
            warn!(job_name = %job_name, error = %e, "could not read remaining lease");
            None
        }
    };

    info!(
        job_name = %job_name,
        remaining_lease_seconds = ?remaining_lease_seconds,
        "job skipped; lease held elsewhere"
    );
    JobOutcome::Skipped {
        job_name: job_name.clone(),
        remaining_lease_seconds,
    }
}

impl std::fmt::Debug for JobSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSupervisor")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::lease::InMemoryLeaseStore;

    fn job(name: &str) -> JobName {
        JobName::new(name).unwrap()
    }

    fn supervisor() -> (SharedLeaseStore, JobSupervisor) {
        let store: SharedLeaseStore = Arc::new(InMemoryLeaseStore::new());
        let sup = JobSupervisor::new(store.clone(), LeaseConfig::default());
        (store, sup)
    }

    #[tokio::test(start_paused = true)]
    async fn completed_run_returns_value_and_frees_lease() {
        let (store, sup) = supervisor();

        let outcome = sup
            .run(&job("send-reminders"), None, || async { Ok::<_, String>(42) })
            .await
            .unwrap();

        assert_eq!(outcome, JobOutcome::Completed { result: 42 });
        let probe = JobLock::new(store, job("send-reminders"), LeaseConfig::default());
        assert!(!probe.is_locked().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn skips_while_another_instance_holds_the_lease() {
        let (store, sup) = supervisor();
        let name = job("nightly-export");

        // Instance A.
        let mut a = JobLock::new(store.clone(), name.clone(), LeaseConfig::new(300, 60).unwrap());
        assert!(a.acquire().await);

        tokio::time::advance(Duration::from_secs(3)).await;

        // Instance B, same 300s window.
        let ran = AtomicUsize::new(0);
        let outcome = sup
            .run(&name, Some(LeaseConfig::new(300, 60).unwrap()), || async {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            })
            .await
            .unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        match outcome {
            JobOutcome::Skipped {
                job_name,
                remaining_lease_seconds,
            } => {
                assert_eq!(job_name, name);
                let remaining = remaining_lease_seconds.unwrap();
                assert!(remaining <= 300);
                assert!(remaining >= 290);
            }
            other => panic!("expected skip, got {other:?}"),
        }

        assert!(a.is_held());
        a.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failing_work_still_releases_lease() {
        let (store, sup) = supervisor();
        let name = job("escalate-invoices");

        let err = sup
            .run(&name, None, || async { Err::<(), _>("smtp timeout".to_string()) })
            .await
            .unwrap_err();
        assert_eq!(err, "smtp timeout");

        let mut fresh = JobLock::new(store, name, LeaseConfig::default());
        assert!(fresh.acquire().await);
        fresh.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_runs_each_acquire() {
        let (_store, sup) = supervisor();
        let name = job("hourly-sync");

        for i in 0..3 {
            let outcome = sup
                .run(&name, None, || async move { Ok::<_, String>(i) })
                .await
                .unwrap();
            assert_eq!(outcome.into_result(), Some(i));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn long_work_keeps_lease_alive() {
        let (store, sup) = supervisor();
        let name = job("slow-report");
        let config = LeaseConfig::new(10, 2).unwrap();

        let probe_store = store.clone();
        let probe_name = name.clone();
        let outcome = sup
            .run(&name, Some(config), || async move {
                // Three lease lengths of work.
                tokio::time::sleep(Duration::from_secs(30)).await;
                let probe = JobLock::new(probe_store, probe_name, config);
                probe.is_locked().await.map_err(|e| e.to_string())
            })
            .await
            .unwrap();

        assert_eq!(outcome.into_result(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn work_observes_takeover_through_lease_watch() {
        let (store, sup) = supervisor();
        let name = job("preempted");
        let config = LeaseConfig::new(10, 2).unwrap();

        let thief_store = store.clone();
        let thief_name = name.clone();
        let outcome = sup
            .run_with_lease(&name, Some(config), |mut watch| async move {
                // Operator clears the lease and another instance grabs it.
                thief_store
                    .delete(&crate::lease::lease_key(&thief_name))
                    .await
                    .map_err(|e| e.to_string())?;
                let mut thief = JobLock::new(thief_store, thief_name, config);
                assert!(thief.acquire().await);

                let lost = watch.lost().await;
                thief.release().await;
                Ok::<_, String>(lost)
            })
            .await
            .unwrap();

        assert_eq!(outcome.into_result(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_run_frees_the_lease_for_the_next_tick() {
        let (store, sup) = supervisor();
        let name = job("nightly-export");

        let attempt = tokio::time::timeout(
            Duration::from_secs(1),
            sup.run(&name, None, || async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, String>(())
            }),
        )
        .await;
        assert!(attempt.is_err());

        // Let the scheduled release run.
        tokio::time::sleep(Duration::from_millis(1)).await;

        let mut next = JobLock::new(store, name, LeaseConfig::default());
        assert!(next.acquire().await);
        next.release().await;
    }
}
