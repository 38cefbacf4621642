//! config.rs — benchmark configuration.
//!
//! Defaults reproduce the reference run: 128-d vectors, 128 000 per phase
//! split into 128 chunks, an inner-product index sized for one million
//! vectors with `M = 90`, `ef_construction = 200` and query `ef = 100`.

use std::path::PathBuf;

use crate::errors::{IngestError, Result};
use crate::math::Metric;
use crate::params::HnswBuilder;
use crate::tensor::Distribution;

/// Distance space of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Space {
    #[default]
    InnerProduct,
    Cosine,
    L2,
}

#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub output: PathBuf,
    pub dim: usize,
    pub num_elements: usize,
    pub chunks: usize,
    pub max_elements: usize,
    pub m: usize,
    pub ef_construction: usize,
    pub ef: usize,
    pub space: Space,
    pub distribution: Distribution,
    pub seed: Option<u64>,
    /// Self-recall queries run after the full phase; 0 disables.
    pub recall_queries: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("a.log"),
            dim: 128,
            num_elements: 128_000,
            chunks: 128,
            max_elements: 1_000_000,
            m: 90,
            ef_construction: 200,
            ef: 100,
            space: Space::InnerProduct,
            distribution: Distribution::StandardNormal,
            seed: None,
            recall_queries: 0,
        }
    }
}

impl BenchConfig {
    /// Vectors inserted by a full run: both phases plus the single vector.
    pub fn planned_total(&self) -> usize {
        self.num_elements * 2 + 1
    }

    /// Reject configurations that cannot run to completion.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(IngestError::shape("dim must be positive"));
        }
        if self.chunks == 0 || self.num_elements % self.chunks != 0 {
            return Err(IngestError::shape(format!(
                "{} elements do not split into {} equal chunks",
                self.num_elements, self.chunks
            )));
        }
        if self.recall_queries > self.num_elements {
            return Err(IngestError::shape(format!(
                "{} recall queries but only {} vectors in the full phase",
                self.recall_queries, self.num_elements
            )));
        }
        let planned = self.planned_total();
        if planned > self.max_elements {
            return Err(IngestError::CapacityExceeded {
                capacity: self.max_elements,
                current: 0,
                requested: planned,
            });
        }
        Ok(())
    }

    /// Index builder carrying this configuration's parameters.
    pub fn builder<M: Metric>(&self, metric: M) -> HnswBuilder<M> {
        let b = HnswBuilder::new(metric)
            .dims(self.dim)
            .max_elements(self.max_elements)
            .m(self.m)
            .ef_construction(self.ef_construction)
            .ef_search(self.ef);
        match self.seed {
            Some(s) => b.seed(s),
            None => b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::InnerProduct;

    #[test]
    fn defaults_fit_capacity() {
        let cfg = BenchConfig::default();
        assert_eq!(cfg.planned_total(), 256_001);
        assert!(cfg.planned_total() < cfg.max_elements);
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_uneven_chunks() {
        let cfg = BenchConfig { chunks: 7, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(IngestError::Shape(_))));
    }

    #[test]
    fn rejects_plan_over_capacity() {
        let cfg = BenchConfig { max_elements: 256_000, ..Default::default() };
        assert!(matches!(
            cfg.validate(),
            Err(IngestError::CapacityExceeded { requested: 256_001, .. })
        ));
        let cfg = BenchConfig { max_elements: 256_001, ..Default::default() };
        cfg.validate().unwrap();
    }

    #[test]
    fn builder_carries_parameters() {
        let cfg = BenchConfig::default();
        let h = cfg.builder(InnerProduct).build();
        assert_eq!(h.dims(), 128);
        assert_eq!(h.max_elements(), 1_000_000);
        assert_eq!(h.params(), (90, 200, 100));
    }
}
