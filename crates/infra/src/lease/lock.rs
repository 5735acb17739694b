//! Lease-based mutual exclusion for one named job.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use joblease_core::{JobName, LeaseConfig};

use super::key::lease_key;
use super::store::{LeaseStoreError, SharedLeaseStore};
use super::token::OwnerToken;

/// Exclusive, self-renewing lease on one job name.
///
/// `acquire` is the only correctness-bearing primitive: it performs a single
/// atomic set-if-absent and never blocks or retries. While held, a background
/// task resets the lease TTL every renewal interval, re-proving ownership on
/// each renewal. `release` stops that task before issuing an ownership-fenced
/// delete, and is safe to call any number of times.
///
/// Dropping a held `JobLock` stops the heartbeat and schedules the same
/// fenced delete on the current runtime; if there is no runtime, or the
/// process dies outright, the lease lapses when its TTL runs out.
pub struct JobLock {
    store: SharedLeaseStore,
    job_name: JobName,
    key: String,
    config: LeaseConfig,
    hold: Option<Hold>,
}

struct Hold {
    token: OwnerToken,
    acquired_at: DateTime<Utc>,
    cancel: CancellationToken,
    heartbeat: JoinHandle<()>,
    lost: watch::Receiver<bool>,
}

/// Observes whether a held lease was taken over while work was running.
///
/// Work that wants stricter exclusivity can poll [`LeaseWatch::is_lost`] or
/// race [`LeaseWatch::lost`] against its own progress and stop early.
#[derive(Debug, Clone)]
pub struct LeaseWatch {
    rx: watch::Receiver<bool>,
}

impl LeaseWatch {
    pub fn is_lost(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves to `true` once the heartbeat observes that another holder owns
    /// the lease, or to `false` if the hold ended (released or dropped) first.
    pub async fn lost(&mut self) -> bool {
        self.rx.wait_for(|lost| *lost).await.is_ok()
    }
}

impl JobLock {
    pub fn new(store: SharedLeaseStore, job_name: JobName, config: LeaseConfig) -> Self {
        let key = lease_key(&job_name);
        Self {
            store,
            job_name,
            key,
            config,
            hold: None,
        }
    }

    pub fn job_name(&self) -> &JobName {
        &self.job_name
    }

    pub fn config(&self) -> LeaseConfig {
        self.config
    }

    /// Try once to take the lease. Returns `true` only if this call created it.
    ///
    /// Contention and store failures both return `false`; a store failure is
    /// never taken as a possible success.
    pub async fn acquire(&mut self) -> bool {
        if self.is_held() {
            debug!(job_name = %self.job_name, "lease already held by this instance");
            return false;
        }
        if let Some(stale) = self.hold.take() {
            // Previous hold was lost to another owner; just make sure its task is gone.
            stale.cancel.cancel();
            join_heartbeat(&self.job_name, stale.heartbeat).await;
        }

        let token = OwnerToken::generate();
        let acquired = self
            .store
            .set_if_absent(&self.key, token.as_str(), self.config.lease_duration())
            .await;

        match acquired {
            Ok(true) => {
                self.hold = Some(self.start_heartbeat(token));
                info!(
                    job_name = %self.job_name,
                    lease_seconds = self.config.lease_seconds(),
                    renewal_seconds = self.config.renewal_seconds(),
                    "lease acquired"
                );
                true
            }
            Ok(false) => {
                debug!(job_name = %self.job_name, "lease held elsewhere");
                false
            }
            Err(e) => {
                error!(
                    job_name = %self.job_name,
                    error = %e,
                    "lease acquire failed; treating as not acquired"
                );
                false
            }
        }
    }

    /// Give the lease back, if this instance still owns it.
    ///
    /// The heartbeat is stopped first, unconditionally. The delete that follows
    /// is fenced by the owner token, so a lease that expired and was reclaimed
    /// by someone else is left alone. Never fails; store errors are logged and
    /// the TTL is left to clean up.
    pub async fn release(&mut self) {
        let Some(hold) = self.hold.take() else {
            debug!(job_name = %self.job_name, "release without a held lease; nothing to do");
            return;
        };

        hold.cancel.cancel();
        join_heartbeat(&self.job_name, hold.heartbeat).await;

        let held_ms = (Utc::now() - hold.acquired_at).num_milliseconds().max(0);
        match self.store.delete_if_owner(&self.key, hold.token.as_str()).await {
            Ok(true) => info!(job_name = %self.job_name, held_ms, "lease released"),
            Ok(false) => info!(
                job_name = %self.job_name,
                held_ms,
                "lease already expired or reclaimed; nothing released"
            ),
            Err(e) => warn!(
                job_name = %self.job_name,
                error = %e,
                "lease release failed; lease will expire by TTL"
            ),
        }
    }

    /// Whether any holder currently has a lease on this job. Diagnostic only.
    pub async fn is_locked(&self) -> Result<bool, LeaseStoreError> {
        Ok(self.store.get(&self.key).await?.is_some())
    }

    /// Seconds until the current lease (whoever holds it) expires. Diagnostic only.
    pub async fn remaining_lease(&self) -> Result<Option<u64>, LeaseStoreError> {
        self.store.ttl(&self.key).await
    }

    /// Local view: this instance acquired the lease and has not seen it taken over.
    pub fn is_held(&self) -> bool {
        self.hold.as_ref().is_some_and(|h| !*h.lost.borrow())
    }

    /// Ownership-loss signal for the current hold, if any.
    pub fn lease_watch(&self) -> Option<LeaseWatch> {
        self.hold.as_ref().map(|h| LeaseWatch { rx: h.lost.clone() })
    }

    fn start_heartbeat(&self, token: OwnerToken) -> Hold {
        let cancel = CancellationToken::new();
        let (lost_tx, lost_rx) = watch::channel(false);

        let heartbeat = tokio::spawn(heartbeat(
            self.store.clone(),
            self.job_name.clone(),
            self.key.clone(),
            token.clone(),
            self.config,
            cancel.clone(),
            lost_tx,
        ));

        Hold {
            token,
            acquired_at: Utc::now(),
            cancel,
            heartbeat,
            lost: lost_rx,
        }
    }
}

#[cfg(test)]
impl JobLock {
    /// Stop renewing without touching the store, as a crashed process would.
    pub(crate) fn halt_heartbeat(&mut self) {
        if let Some(hold) = self.hold.take() {
            hold.cancel.cancel();
            hold.heartbeat.abort();
        }
    }
}

impl std::fmt::Debug for JobLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobLock")
            .field("job_name", &self.job_name)
            .field("config", &self.config)
            .field("held", &self.is_held())
            .finish()
    }
}

impl Drop for JobLock {
    /// Stops the heartbeat and, when a runtime is available, hands the
    /// fenced delete to it so an abandoned attempt (timeout, disconnected
    /// caller, panicking work) frees the lease right away. Without a runtime
    /// the lease expires by TTL.
    fn drop(&mut self) {
        let Some(hold) = self.hold.take() else {
            return;
        };
        hold.cancel.cancel();
        hold.heartbeat.abort();

        if *hold.lost.borrow() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(job_name = %self.job_name, "lock dropped outside a runtime; lease left to expire");
            return;
        };

        let store = self.store.clone();
        let key = self.key.clone();
        let job_name = self.job_name.clone();
        let token = hold.token;
        runtime.spawn(async move {
            match store.delete_if_owner(&key, token.as_str()).await {
                Ok(true) => info!(job_name = %job_name, "lease released after its lock was dropped"),
                Ok(false) => debug!(job_name = %job_name, "dropped lock no longer owned its lease"),
                Err(e) => warn!(
                    job_name = %job_name,
                    error = %e,
                    "release of dropped lock failed; lease will expire by TTL"
                ),
            }
        });
    }
}

async fn join_heartbeat(job_name: &JobName, heartbeat: JoinHandle<()>) {
    if let Err(e) = heartbeat.await {
        if e.is_panic() {
            error!(job_name = %job_name, "lease heartbeat panicked");
        }
    }
}

async fn heartbeat(
    store: SharedLeaseStore,
    job_name: JobName,
    key: String,
    token: OwnerToken,
    config: LeaseConfig,
    cancel: CancellationToken,
    lost: watch::Sender<bool>,
) {
    let period = config.renewal_interval();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // A renewal cut short here is harmless: the script re-checks ownership
        // on the server, so a late renewal cannot touch a lease we no longer own.
        let renewed = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            r = store.renew_if_owner(&key, token.as_str(), config.lease_duration()) => r,
        };

        match renewed {
            Ok(true) => debug!(job_name = %job_name, "lease renewed"),
            Ok(false) => {
                warn!(
                    job_name = %job_name,
                    "lease ownership lost; stopping renewal"
                );
                lost.send_replace(true);
                break;
            }
            Err(e) => warn!(
                job_name = %job_name,
                error = %e,
                "lease renewal failed; retrying next interval"
            ),
        }
    }

    debug!(job_name = %job_name, "lease heartbeat stopped");
}
