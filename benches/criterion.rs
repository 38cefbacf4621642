//! Criterion benchmark entry: k-NN search latency.
//!
//! Run with
//! ```bash
//! cargo bench --bench criterion
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hnsw_ingest::tensor::{random_tensor, seeded_rng, to_batch, Distribution};
use hnsw_ingest::{Hnsw, HnswBuilder, InnerProduct};

const DIMS: usize = 128;
const NUM_VECS: usize = 10_000;
const K: usize = 10;

fn build_index() -> Hnsw<InnerProduct> {
    let mut h = HnswBuilder::new(InnerProduct)
        .dims(DIMS)
        .max_elements(NUM_VECS)
        .m(16)
        .ef_construction(200)
        .ef_search(50)
        .seed(47)
        .build();

    let mut rng = seeded_rng(Some(47));
    let data = to_batch(&random_tensor([1, 1, NUM_VECS, DIMS], Distribution::StandardNormal, &mut rng)).unwrap();
    h.add_items(data.view()).unwrap();
    h
}

fn bench_knn(c: &mut Criterion) {
    let h = build_index();
    let query = vec![0.1_f32; DIMS];

    let mut group = c.benchmark_group("knn_search");
    group.throughput(Throughput::Elements(1));

    group.bench_function(BenchmarkId::from_parameter(K), |b| {
        b.iter(|| h.search(&query, K))
    });

    group.finish();
}

criterion_group!(benches, bench_knn);
criterion_main!(benches);
