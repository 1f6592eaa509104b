use criterion::{black_box, criterion_group, criterion_main, Criterion};
use twbulk::{chunks, ensure_at_least_one};

fn benchmark_chunk_parallel_sources(c: &mut Criterion) {
    let ids: Vec<u64> = (0..10_000).collect();
    let names: Vec<u64> = (10_000..15_000).collect();

    c.bench_function("chunk_parallel_sources", |b| {
        b.iter(|| {
            chunks(vec![ids.iter(), names.iter()], black_box(100))
                .map(|produced| produced.count())
                .unwrap_or_default()
        })
    });
}

fn benchmark_identity_batches(c: &mut Criterion) {
    let user_ids: Vec<u64> = (1..=5_000).collect();
    let screen_names: Vec<String> = (0..5_000).map(|i| format!("user_{i}")).collect();
    let identities = ensure_at_least_one(Some(user_ids), Some(screen_names))
        .expect("identity lists are non-empty");

    c.bench_function("identity_batches", |b| {
        b.iter(|| {
            identities
                .chunks(black_box(100))
                .map(|batches| batches.map(|batch| batch.len()).sum::<usize>())
                .unwrap_or_default()
        })
    });
}

criterion_group!(benches, benchmark_chunk_parallel_sources, benchmark_identity_batches);
criterion_main!(benches);
