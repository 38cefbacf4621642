//! bench.rs — timed insertion scenario.
//!
//! Three phases against one index:
//! 1. a `(1, 1, n, dim)` tensor split into `chunks` batches, each timed;
//! 2. a second `(1, 1, n, dim)` tensor inserted in a single call;
//! 3. one extra vector.
//!
//! Every insertion call produces one report line. Errors abort the run.

use std::io::Write;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::BenchConfig;
use crate::errors::{IngestError, Result};
use crate::report::Reporter;
use crate::tensor::{random_tensor, seeded_rng, split_batches, to_batch, Batch, ELEMENT_AXIS};
use crate::{ExternalId, VectorIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `n`-th slice of the chunked tensor.
    Chunk(usize),
    Full,
    Single,
}

#[derive(Debug, Clone)]
pub struct Timing {
    pub phase: Phase,
    pub rows: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct BenchSummary {
    pub timings: Vec<Timing>,
    /// Vectors handed to the index across all calls.
    pub inserted: usize,
    /// Index size after the last call.
    pub index_len: usize,
    /// Fraction of full-phase vectors that found themselves as top hit.
    pub recall: Option<f64>,
}

impl BenchSummary {
    pub fn total_elapsed(&self) -> Duration {
        self.timings.iter().map(|t| t.elapsed).sum()
    }
}

/// Insert one batch, report its wall-clock latency and return it.
pub fn timed_insert<I, W>(index: &mut I, batch: &Batch, reporter: &mut Reporter<W>) -> Result<Duration>
where
    I: VectorIndex + ?Sized,
    W: Write,
{
    let start = Instant::now();
    index.add_items(batch.view())?;
    let elapsed = start.elapsed();
    reporter.latency(elapsed)?;
    Ok(elapsed)
}

/// Run the full scenario described by `cfg` against `index`.
///
/// The planned total is checked against the index's remaining capacity
/// before any data is generated.
pub fn run<I, W>(cfg: &BenchConfig, index: &mut I, reporter: &mut Reporter<W>) -> Result<BenchSummary>
where
    I: VectorIndex + Sync,
    W: Write,
{
    cfg.validate()?;
    if index.dims() != cfg.dim {
        return Err(IngestError::DimensionMismatch {
            expected: index.dims(),
            found: cfg.dim,
        });
    }
    let planned = cfg.planned_total();
    if planned > index.remaining_capacity() {
        return Err(IngestError::CapacityExceeded {
            capacity: index.max_elements(),
            current: index.len(),
            requested: planned,
        });
    }
    index.set_ef(cfg.ef);
    info!(planned, capacity = index.max_elements(), dim = cfg.dim, "starting ingest run");

    let mut rng = seeded_rng(cfg.seed);
    let mut summary = BenchSummary::default();
    let record = |summary: &mut BenchSummary, phase: Phase, rows: usize, elapsed: Duration| {
        debug!(?phase, rows, secs = elapsed.as_secs_f64(), "batch inserted");
        summary.inserted += rows;
        summary.timings.push(Timing { phase, rows, elapsed });
    };

    // Phase 1: chunked.
    let batches = {
        let k = random_tensor([1, 1, cfg.num_elements, cfg.dim], cfg.distribution, &mut rng);
        split_batches(&k, cfg.chunks, ELEMENT_AXIS)?
    };
    for (i, batch) in batches.iter().enumerate() {
        let elapsed = timed_insert(index, batch, reporter)?;
        record(&mut summary, Phase::Chunk(i), batch.nrows(), elapsed);
    }
    drop(batches);
    info!(len = index.len(), "chunked phase done");

    // Phase 2: one large call.
    let full_start = index.len() as ExternalId;
    let full = to_batch(&random_tensor([1, 1, cfg.num_elements, cfg.dim], cfg.distribution, &mut rng))?;
    let elapsed = timed_insert(index, &full, reporter)?;
    record(&mut summary, Phase::Full, full.nrows(), elapsed);
    info!(len = index.len(), secs = elapsed.as_secs_f64(), "full phase done");

    if cfg.recall_queries > 0 {
        summary.recall = Some(self_recall(&*index, &full, full_start, cfg.recall_queries)?);
    }
    drop(full);

    // Phase 3: a single vector.
    let single = to_batch(&random_tensor([1, 1, 1, cfg.dim], cfg.distribution, &mut rng))?;
    let elapsed = timed_insert(index, &single, reporter)?;
    record(&mut summary, Phase::Single, single.nrows(), elapsed);

    summary.index_len = index.len();
    info!(
        inserted = summary.inserted,
        len = summary.index_len,
        total_secs = summary.total_elapsed().as_secs_f64(),
        "ingest run finished"
    );
    Ok(summary)
}

/// Search the first `queries` rows of `batch` (stored under ids starting at
/// `first_id`) in parallel and return the fraction that come back as their
/// own nearest neighbour.
pub fn self_recall<I>(index: &I, batch: &Batch, first_id: ExternalId, queries: usize) -> Result<f64>
where
    I: VectorIndex + Sync + ?Sized,
{
    let n = queries.min(batch.nrows());
    if n == 0 {
        return Ok(0.0);
    }
    let hits: Vec<bool> = (0..n)
        .into_par_iter()
        .map(|i| -> Result<bool> {
            let row = batch.row(i);
            let q = row
                .as_slice()
                .ok_or_else(|| IngestError::shape("query row is not contiguous"))?;
            let top = index.search(q, 1)?;
            Ok(top.first().map(|h| h.0) == Some(first_id + i as ExternalId))
        })
        .collect::<Result<_>>()?;
    let recall = hits.iter().filter(|&&h| h).count() as f64 / n as f64;
    info!(queries = n, recall, "self-recall measured");
    Ok(recall)
}
