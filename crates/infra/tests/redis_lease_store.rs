//! Lease behaviour against a real Redis.
//!
//! Runs only with `--features redis` and `JOBLEASE_TEST_REDIS_URL` set
//! (e.g. `redis://127.0.0.1:6379/15`); otherwise each test returns early.

#![cfg(feature = "redis")]

use std::sync::Arc;
use std::time::Duration;

use joblease_core::{JobName, LeaseConfig};
use joblease_infra::lease::{JobLock, LeaseStore, RedisLeaseStore, SharedLeaseStore, lease_key};
use joblease_infra::{JobOutcome, JobSupervisor, LockConsole};

async fn redis_store() -> Option<SharedLeaseStore> {
    let url = std::env::var("JOBLEASE_TEST_REDIS_URL").ok()?;
    let store = RedisLeaseStore::connect(url)
        .await
        .expect("failed to connect to test redis");
    Some(Arc::new(store))
}

fn unique_job(prefix: &str) -> JobName {
    JobName::new(format!("{prefix}-{}", uuid::Uuid::now_v7().simple())).unwrap()
}

#[tokio::test]
async fn only_one_of_many_concurrent_acquires_wins() {
    let Some(store) = redis_store().await else { return };
    let name = unique_job("contended");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        let name = name.clone();
        handles.push(tokio::spawn(async move {
            let mut lock = JobLock::new(store, name, LeaseConfig::new(30, 10).unwrap());
            let won = lock.acquire().await;
            (won, lock)
        }));
    }

    let mut locks = Vec::new();
    for h in handles {
        locks.push(h.await.unwrap());
    }
    assert_eq!(locks.iter().filter(|(won, _)| *won).count(), 1);

    for (_, mut lock) in locks {
        lock.release().await;
    }
}

#[tokio::test]
async fn scripts_fence_renew_and_release() {
    let Some(store) = redis_store().await else { return };
    let key = lease_key(&unique_job("fenced"));

    assert!(store.set_if_absent(&key, "owner-a", Duration::from_secs(30)).await.unwrap());
    assert!(!store.renew_if_owner(&key, "owner-b", Duration::from_secs(60)).await.unwrap());
    assert!(!store.delete_if_owner(&key, "owner-b").await.unwrap());
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("owner-a"));

    assert!(store.renew_if_owner(&key, "owner-a", Duration::from_secs(60)).await.unwrap());
    let ttl = store.ttl(&key).await.unwrap().unwrap();
    assert!(ttl > 30 && ttl <= 60);

    assert!(store.delete_if_owner(&key, "owner-a").await.unwrap());
    assert_eq!(store.ttl(&key).await.unwrap(), None);
}

#[tokio::test]
async fn lease_expires_when_holder_disappears() {
    let Some(store) = redis_store().await else { return };
    let name = unique_job("crashy");

    // A holder that died without releasing: its key just sits there until the TTL.
    assert!(store
        .set_if_absent(&lease_key(&name), "dead-owner", Duration::from_secs(2))
        .await
        .unwrap());

    let mut next = JobLock::new(store.clone(), name.clone(), LeaseConfig::new(2, 1).unwrap());
    assert!(!next.acquire().await);

    tokio::time::sleep(Duration::from_millis(2_500)).await;

    assert!(next.acquire().await);
    next.release().await;
}

#[tokio::test]
async fn dropped_lock_releases_its_lease() {
    let Some(store) = redis_store().await else { return };
    let name = unique_job("dropped");

    let mut holder = JobLock::new(store.clone(), name.clone(), LeaseConfig::new(30, 10).unwrap());
    assert!(holder.acquire().await);
    drop(holder);

    let mut next = JobLock::new(store, name, LeaseConfig::new(30, 10).unwrap());
    let mut acquired = false;
    for _ in 0..50 {
        if next.acquire().await {
            acquired = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(acquired);
    next.release().await;
}

#[tokio::test]
async fn supervisor_and_console_round_trip() {
    let Some(store) = redis_store().await else { return };
    let name = unique_job("stuck-job");
    let console = LockConsole::new(store.clone());
    let supervisor = JobSupervisor::new(store.clone(), LeaseConfig::default());

    let mut a = JobLock::new(store.clone(), name.clone(), LeaseConfig::default());
    assert!(a.acquire().await);

    let listed = console.list_lock_status().await.unwrap();
    assert!(listed.iter().any(|s| s.job_name == name && s.locked));

    let outcome = supervisor
        .run(&name, None, || async { Ok::<_, String>(()) })
        .await
        .unwrap();
    assert!(matches!(outcome, JobOutcome::Skipped { remaining_lease_seconds: Some(s), .. } if s <= 300));

    assert!(console.force_release(&name).await.unwrap());
    a.release().await;

    let outcome = supervisor
        .run(&name, None, || async { Ok::<_, String>("ran") })
        .await
        .unwrap();
    assert_eq!(outcome.into_result(), Some("ran"));
}
