//! params.rs — builder for configuring an `Hnsw<M>` instance.

use crate::{
    graph::Graph,
    math::{InnerProduct, Metric},
    Hnsw,
};

const DEF_M: usize               = 16;
const DEF_EF_CONSTRUCTION: usize = 200;
const DEF_EF_SEARCH: usize       = 10;
const DEF_MAX_ELEMENTS: usize    = 1_000_000;

/// Builder pattern for `Hnsw`.
pub struct HnswBuilder<M: Metric = InnerProduct> {
    dims:             Option<usize>,
    max_elements:     usize,
    m:                usize,
    ef_construction:  usize,
    ef_search:        usize,
    seed:             Option<u64>,
    metric:           M,
}

impl<M: Metric> HnswBuilder<M> {
    /// Create with defaults (dims is `None`; must be set).
    pub fn new(metric: M) -> Self {
        Self {
            dims: None,
            max_elements: DEF_MAX_ELEMENTS,
            m: DEF_M,
            ef_construction: DEF_EF_CONSTRUCTION,
            ef_search: DEF_EF_SEARCH,
            seed: None,
            metric,
        }
    }

    /// Set dimensionality (required).
    pub fn dims(mut self, d: usize) -> Self {
        self.dims = Some(d);
        self
    }

    /// Set the maximum number of stored vectors.
    pub fn max_elements(mut self, n: usize) -> Self {
        self.max_elements = n;
        self
    }

    /// Set `M` (max neighbours per upper layer; layer 0 keeps `2*M`).
    pub fn m(mut self, m: usize) -> Self {
        self.m = m;
        self
    }

    /// Set efConstruction (controls accuracy vs. build-time).
    pub fn ef_construction(mut self, ef: usize) -> Self {
        self.ef_construction = ef;
        self
    }

    /// Set efSearch (default search beam width).
    pub fn ef_search(mut self, ef: usize) -> Self {
        self.ef_search = ef;
        self
    }

    /// Seed the level generator for reproducible graphs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Swap metric type (handy when starting from default builder).
    pub fn metric<T: Metric>(self, metric: T) -> HnswBuilder<T> {
        HnswBuilder {
            dims: self.dims,
            max_elements: self.max_elements,
            m: self.m,
            ef_construction: self.ef_construction,
            ef_search: self.ef_search,
            seed: self.seed,
            metric,
        }
    }

    /// Finish and obtain an `Hnsw`.
    ///
    /// Does **not** panic. If `dims()` was not set, this builds an empty index with
    /// `dims = 0`. Any subsequent `insert()` will return `IngestError::DimensionMismatch`.
    pub fn build(self) -> Hnsw<M> {
        let dims = self.dims.unwrap_or(0);
        debug_assert!(dims > 0, "HnswBuilder: call .dims() before build()");
        Hnsw {
            dims,
            m: self.m.max(2),
            ef_construction: self.ef_construction,
            ef: self.ef_search,
            max_elements: self.max_elements,
            metric: self.metric,
            graph: Graph::new(self.seed),
        }
    }
}

impl Default for HnswBuilder<InnerProduct> {
    fn default() -> Self {
        Self::new(InnerProduct)
    }
}
