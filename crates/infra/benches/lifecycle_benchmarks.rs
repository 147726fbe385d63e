use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use chrono::Duration;
use std::sync::Arc;

use gigboard_core::{Timestamp, UserId};
use gigboard_infra::collections;
use gigboard_infra::{DocumentStore, InMemoryDocumentStore, LifecycleEngine};
use gigboard_jobs::{JobKind, StagedJob};

fn seed_engine(staged_jobs: usize) -> LifecycleEngine<Arc<InMemoryDocumentStore>> {
    let store = InMemoryDocumentStore::arc();
    let now = Timestamp::now();

    for i in 0..staged_jobs {
        let job = StagedJob {
            title: format!("job-{i}"),
            created_by: UserId::new(),
            kind: JobKind::Challenge {
                start: Some(now - Duration::hours(1)),
            },
            deadline: now + Duration::days(7),
            created_at: now,
            last_updated: now,
        };
        store
            .insert(collections::STAGED_JOBS, serde_json::to_value(&job).unwrap())
            .unwrap();
    }

    LifecycleEngine::new(store)
}

/// Activation is the hot batch path: full scan, resolve, one atomic batch.
fn activation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("activate_staged_jobs");
    for n in [100usize, 1_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || seed_engine(n),
                |engine| engine.activate_staged_jobs().unwrap(),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, activation_benchmark);
criterion_main!(benches);
