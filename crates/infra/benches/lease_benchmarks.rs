use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use joblease_core::{JobName, LeaseConfig};
use joblease_infra::lease::{InMemoryLeaseStore, JobLock, SharedLeaseStore};
use joblease_infra::{JobSupervisor, LockConsole};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn bench_acquire_release(c: &mut Criterion) {
    let rt = runtime();
    let store: SharedLeaseStore = Arc::new(InMemoryLeaseStore::new());
    let name = JobName::new("bench-job").unwrap();

    c.bench_function("lock_acquire_release", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut lock = JobLock::new(store.clone(), name.clone(), LeaseConfig::default());
                let acquired = lock.acquire().await;
                lock.release().await;
                black_box(acquired)
            })
        })
    });

    // Contended path: the lease is held, every attempt is a single failed set.
    let mut holder = JobLock::new(store.clone(), name.clone(), LeaseConfig::default());
    rt.block_on(holder.acquire());
    c.bench_function("lock_acquire_contended", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut lock = JobLock::new(store.clone(), name.clone(), LeaseConfig::default());
                black_box(lock.acquire().await)
            })
        })
    });
    rt.block_on(holder.release());
}

fn bench_supervised_run(c: &mut Criterion) {
    let rt = runtime();
    let store: SharedLeaseStore = Arc::new(InMemoryLeaseStore::new());
    let supervisor = JobSupervisor::new(store, LeaseConfig::default());
    let name = JobName::new("bench-supervised").unwrap();

    c.bench_function("supervisor_run_noop", |b| {
        b.iter(|| {
            rt.block_on(async {
                let outcome = supervisor
                    .run(&name, None, || async { Ok::<_, String>(()) })
                    .await;
                black_box(outcome)
            })
        })
    });
}

fn bench_list_status(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("console_list_lock_status");

    for lease_count in [10usize, 100, 1000] {
        let store: SharedLeaseStore = Arc::new(InMemoryLeaseStore::new());
        let console = LockConsole::new(store.clone());
        let mut held = Vec::with_capacity(lease_count);
        for i in 0..lease_count {
            let name = JobName::new(format!("job-{i}")).unwrap();
            let mut lock = JobLock::new(store.clone(), name, LeaseConfig::default());
            rt.block_on(lock.acquire());
            held.push(lock);
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(lease_count),
            &lease_count,
            |b, _| b.iter(|| rt.block_on(console.list_lock_status()).unwrap()),
        );

        for mut lock in held {
            rt.block_on(lock.release());
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_acquire_release,
    bench_supervised_run,
    bench_list_status
);
criterion_main!(benches);
