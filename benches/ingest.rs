//! ingest.rs — Criterion batch-insert latency across batch sizes.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use hnsw_ingest::tensor::{random_tensor, seeded_rng, to_batch, Batch, Distribution};
use hnsw_ingest::{HnswBuilder, InnerProduct};

const DIMS: usize = 128;
const PREFILL: usize = 2_000;

fn batch(rows: usize, seed: u64) -> Batch {
    let mut rng = seeded_rng(Some(seed));
    to_batch(&random_tensor([1, 1, rows, DIMS], Distribution::StandardNormal, &mut rng)).unwrap()
}

fn bench_add_items(c: &mut Criterion) {
    let prefill = batch(PREFILL, 1);
    let mut group = c.benchmark_group("add_items");
    group.sample_size(10);

    for rows in [1usize, 100, 1_000] {
        let data = batch(rows, 2);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter_batched(
                || {
                    let mut h = HnswBuilder::new(InnerProduct)
                        .dims(DIMS)
                        .m(90)
                        .ef_construction(200)
                        .seed(47)
                        .build();
                    h.add_items(prefill.view()).unwrap();
                    h
                },
                |mut h| h.add_items(data.view()).unwrap(),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add_items);
criterion_main!(benches);
