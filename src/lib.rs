//! hnsw-ingest — insertion-latency benchmark over an in-process HNSW index.
//!
//! * `Hnsw<M>`: capacity-bounded HNSW index with automatic identifiers
//! * `tensor`: random 4-D `f32` tensors and batch slicing (`ndarray`)
//! * `bench`: timed insertion scenario, reported through a scoped `Reporter`
//! * Optional AVX2 fast-path behind `--features simd`
//! * Optional snapshot via `serde` feature
//!
//! ## Quick-start
//! ```rust
//! use hnsw_ingest::{HnswBuilder, InnerProduct};
//! use ndarray::Array2;
//!
//! let mut h = HnswBuilder::new(InnerProduct)
//!     .dims(16)
//!     .max_elements(100)
//!     .build();
//!
//! let ids = h.add_items(Array2::<f32>::ones((3, 16)).view()).unwrap();
//! assert_eq!(ids, vec![0, 1, 2]);
//! assert_eq!(h.len(), 3);
//! ```

mod errors;
mod graph;
mod math;
mod node;
mod params;
mod rand_level;

pub mod bench;
pub mod config;
pub mod report;
pub mod tensor;

#[cfg(feature = "serde")]
mod serialize;

#[cfg(feature = "serde")]
pub use serialize::{from_slice, to_bytes};

pub use errors::{IngestError, Result};
pub use graph::AddOutcome;
pub use math::{Cosine, InnerProduct, Metric, L2};
pub use params::HnswBuilder;

pub use rand_level::draw_level;

use ndarray::ArrayView2;
use tracing::warn;

/// Public identifier type attached to each vector.
pub type ExternalId = u64;
/// `(id, distance)` tuple returned by `search`.
pub type SearchHit = (ExternalId, f32);

/// What the timing harness needs from an index.
pub trait VectorIndex {
    fn dims(&self) -> usize;
    fn len(&self) -> usize;
    fn max_elements(&self) -> usize;
    fn set_ef(&mut self, ef: usize);
    /// Append a `(count, dims)` batch; identifiers are assigned automatically.
    fn add_items(&mut self, batch: ArrayView2<'_, f32>) -> Result<Vec<ExternalId>>;
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remaining_capacity(&self) -> usize {
        self.max_elements().saturating_sub(self.len())
    }
}

/// Main index structure.
pub struct Hnsw<M: Metric = InnerProduct> {
    pub(crate) dims: usize,
    pub(crate) m: usize,
    pub(crate) ef_construction: usize,
    pub(crate) ef: usize,
    pub(crate) max_elements: usize,
    pub(crate) metric: M,
    pub(crate) graph: graph::Graph,
}

impl<M: Metric> Hnsw<M> {
    /// Return the embedding dimensionality this index was built for.
    #[inline] pub fn dims(&self) -> usize { self.dims }

    /// Number of stored vectors.
    #[inline] pub fn len(&self) -> usize { self.graph.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.graph.is_empty() }

    /// Hard upper bound on stored vectors.
    #[inline] pub fn max_elements(&self) -> usize { self.max_elements }

    #[inline] pub fn remaining_capacity(&self) -> usize {
        self.max_elements.saturating_sub(self.len())
    }

    /// Set query-time ef
    #[inline] pub fn set_ef(&mut self, ef: usize) { self.ef = ef; }

    /// `(M, ef_construction, ef)`
    #[inline] pub fn params(&self) -> (usize, usize, usize) {
        (self.m, self.ef_construction, self.ef)
    }

    /// Nodes per top layer, ground layer first.
    pub fn level_sizes(&self) -> Vec<usize> {
        self.graph.level_sizes()
    }

    pub fn contains(&self, ext_id: ExternalId) -> bool {
        self.graph.contains_ext(ext_id)
    }

    /// Insert a vector with an external identifier. Re-using an identifier
    /// replaces its vector and does not consume capacity.
    pub fn insert(&mut self, vec: Vec<f32>, ext_id: ExternalId) -> Result<AddOutcome> {
        self.check_dims(vec.len())?;
        if !self.graph.contains_ext(ext_id) {
            self.check_capacity(1)?;
        }
        Ok(self
            .graph
            .add(vec, ext_id, &self.metric, self.m, self.ef_construction))
    }

    /// Append a batch, labelling row `i` as `len() + i`.
    pub fn add_items(&mut self, batch: ArrayView2<'_, f32>) -> Result<Vec<ExternalId>> {
        let start = self.len() as ExternalId;
        let ids: Vec<ExternalId> = (start..start + batch.nrows() as ExternalId).collect();
        self.add_items_with_ids(batch, &ids)?;
        Ok(ids)
    }

    /// Insert a batch with caller-supplied labels.
    ///
    /// Shape and capacity are validated for the whole batch first; on error
    /// the index is left untouched.
    pub fn add_items_with_ids(&mut self, batch: ArrayView2<'_, f32>, ids: &[ExternalId]) -> Result<()> {
        self.check_dims(batch.ncols())?;
        if ids.len() != batch.nrows() {
            return Err(IngestError::shape(format!(
                "{} labels for {} rows",
                ids.len(),
                batch.nrows()
            )));
        }
        let mut fresh = std::collections::HashSet::with_capacity(ids.len());
        for &id in ids {
            if !self.graph.contains_ext(id) {
                fresh.insert(id);
            }
        }
        self.check_capacity(fresh.len())?;

        for (row, &id) in batch.rows().into_iter().zip(ids) {
            self.graph
                .add(row.to_vec(), id, &self.metric, self.m, self.ef_construction);
        }
        Ok(())
    }

    /// k-nearest neighbour search.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.graph.is_empty() {
            return Err(IngestError::EmptyIndex);
        }
        self.check_dims(query.len())?;
        Ok(self.graph.knn(query, k, &self.metric, self.ef))
    }

    fn check_dims(&self, found: usize) -> Result<()> {
        if found != self.dims {
            return Err(IngestError::DimensionMismatch {
                expected: self.dims,
                found,
            });
        }
        Ok(())
    }

    fn check_capacity(&self, requested: usize) -> Result<()> {
        let current = self.len();
        if current + requested > self.max_elements {
            warn!(current, requested, capacity = self.max_elements, "insert rejected");
            return Err(IngestError::CapacityExceeded {
                capacity: self.max_elements,
                current,
                requested,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Snapshot helpers (enabled with `serde`)
    // ------------------------------------------------------------------
    #[cfg(feature = "serde")]
    /// Serialise index to bytes (`serde_json`).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serialize::to_bytes(self)
    }

    #[cfg(feature = "serde")]
    /// Restore index from bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self>
    where
        M: Default,
    {
        serialize::from_slice::<M>(bytes)
    }
}

impl<M: Metric> VectorIndex for Hnsw<M> {
    fn dims(&self) -> usize {
        Hnsw::dims(self)
    }

    fn len(&self) -> usize {
        Hnsw::len(self)
    }

    fn max_elements(&self) -> usize {
        Hnsw::max_elements(self)
    }

    fn set_ef(&mut self, ef: usize) {
        Hnsw::set_ef(self, ef)
    }

    fn add_items(&mut self, batch: ArrayView2<'_, f32>) -> Result<Vec<ExternalId>> {
        Hnsw::add_items(self, batch)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        Hnsw::search(self, query, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{random_tensor, seeded_rng, to_batch, Distribution};
    use ndarray::{array, Array2};

    fn small_index(max: usize) -> Hnsw<InnerProduct> {
        HnswBuilder::new(InnerProduct)
            .dims(8)
            .max_elements(max)
            .m(8)
            .ef_construction(64)
            .ef_search(32)
            .seed(47)
            .build()
    }

    #[test]
    fn smoke_insert_search() {
        let mut h = HnswBuilder::new(Cosine).dims(16).seed(1).build();
        h.insert(vec![1.0; 16], 1).unwrap();
        let res = h.search(&vec![1.0; 16], 1).unwrap();
        assert_eq!(res[0].0, 1);
    }

    #[test]
    fn auto_ids_continue_across_batches() {
        let mut h = small_index(100);
        let a = h.add_items(Array2::<f32>::ones((4, 8)).view()).unwrap();
        let b = h.add_items(Array2::<f32>::ones((2, 8)).view()).unwrap();
        assert_eq!(a, vec![0, 1, 2, 3]);
        assert_eq!(b, vec![4, 5]);
        assert_eq!(h.len(), 6);
    }

    #[test]
    fn size_equals_sum_of_batches() {
        let mut rng = seeded_rng(Some(3));
        let mut h = small_index(1_000);
        let mut expected = 0;
        for n in [10usize, 1, 37, 100] {
            let t = random_tensor([1, 1, n, 8], Distribution::StandardNormal, &mut rng);
            let batch = to_batch(&t).unwrap();
            h.add_items(batch.view()).unwrap();
            expected += n;
            assert_eq!(h.len(), expected);
        }
    }

    #[test]
    fn wrong_width_fails_and_inserts_nothing() {
        let mut h = small_index(100);
        h.add_items(Array2::<f32>::zeros((2, 8)).view()).unwrap();
        let err = h.add_items(Array2::<f32>::zeros((3, 7)).view()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::DimensionMismatch { expected: 8, found: 7 }
        ));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn capacity_overflow_is_all_or_nothing() {
        let mut h = small_index(5);
        h.add_items(Array2::<f32>::ones((3, 8)).view()).unwrap();
        let err = h.add_items(Array2::<f32>::ones((3, 8)).view()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::CapacityExceeded { capacity: 5, current: 3, requested: 3 }
        ));
        assert_eq!(h.len(), 3);
        assert_eq!(h.remaining_capacity(), 2);
        h.add_items(Array2::<f32>::ones((2, 8)).view()).unwrap();
        assert_eq!(h.remaining_capacity(), 0);
    }

    #[test]
    fn upsert_keeps_size_and_replaces_vector() {
        let mut h = HnswBuilder::new(L2).dims(2).max_elements(3).seed(9).build();
        let batch = array![[0.0_f32, 0.0], [10.0, 0.0], [0.0, 10.0]];
        h.add_items(batch.view()).unwrap();
        assert_eq!(h.remaining_capacity(), 0);

        // Full index, but relabelling an existing id is still allowed.
        let outcome = h.insert(vec![10.0, 10.0], 0).unwrap();
        assert_eq!(outcome, AddOutcome::Updated);
        assert_eq!(h.len(), 3);
        assert_eq!(h.search(&[9.0, 9.0], 1).unwrap()[0].0, 0);

        assert!(matches!(
            h.insert(vec![1.0, 1.0], 99),
            Err(IngestError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn label_count_must_match_rows() {
        let mut h = small_index(10);
        let err = h
            .add_items_with_ids(Array2::<f32>::zeros((2, 8)).view(), &[1])
            .unwrap_err();
        assert!(matches!(err, IngestError::Shape(_)));
        assert!(h.is_empty());
    }

    #[test]
    fn search_on_empty_index_errors() {
        let h = small_index(10);
        assert!(matches!(h.search(&[0.0; 8], 1), Err(IngestError::EmptyIndex)));
    }

    #[test]
    fn self_recall_is_high_on_random_data() {
        let mut rng = seeded_rng(Some(47));
        let t = random_tensor([1, 1, 500, 8], Distribution::Uniform, &mut rng);
        let batch = to_batch(&t).unwrap();
        let mut h = HnswBuilder::new(L2)
            .dims(8)
            .max_elements(500)
            .m(16)
            .ef_construction(100)
            .ef_search(64)
            .seed(47)
            .build();
        h.add_items(batch.view()).unwrap();
        let hits = batch
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(i, row)| h.search(row.as_slice().unwrap(), 1).unwrap()[0].0 == *i as u64)
            .count();
        assert!(hits >= 475, "recall {hits}/500");
    }

    #[test]
    fn set_ef_is_reflected_in_params() {
        let mut h = small_index(10);
        h.set_ef(100);
        assert_eq!(h.params(), (8, 64, 100));
    }
}
