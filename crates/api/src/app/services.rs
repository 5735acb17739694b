//! Infrastructure wiring: lease store, supervisor, console, job registry.

use std::sync::Arc;

use tracing::{info, warn};

use joblease_core::LeaseConfig;
use joblease_infra::config::{Settings, StoreBackend};
use joblease_infra::lease::RedisLeaseStore;
use joblease_infra::{
    InMemoryLeaseStore, JobRegistry, JobSupervisor, LeaseStoreError, LockConsole, SharedLeaseStore,
};

/// Everything the HTTP handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub supervisor: JobSupervisor,
    pub console: LockConsole,
    pub registry: JobRegistry,
}

impl AppServices {
    pub fn new(store: SharedLeaseStore, defaults: LeaseConfig, registry: JobRegistry) -> Self {
        Self {
            supervisor: JobSupervisor::new(store.clone(), defaults),
            console: LockConsole::new(store),
            registry,
        }
    }

    pub fn defaults(&self) -> LeaseConfig {
        self.supervisor.defaults()
    }
}

/// Connect the lease store selected by `settings`.
pub async fn build_store(settings: &Settings) -> Result<SharedLeaseStore, LeaseStoreError> {
    match settings.store {
        StoreBackend::Memory => {
            warn!("using in-memory lease store; locks are not shared across instances");
            Ok(Arc::new(InMemoryLeaseStore::new()))
        }
        StoreBackend::Redis => {
            let store = RedisLeaseStore::connect(&settings.redis_url).await?;
            info!("connected to redis lease store");
            Ok(Arc::new(store))
        }
    }
}
