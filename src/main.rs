//! `hnsw-ingest` — time batch insertions into an HNSW index.
//!
//! ```bash
//! cargo run --release -- --output a.log
//! RUST_LOG=debug cargo run --release -- --num-elements 12800 --seed 47 --recall-queries 1000
//! ```
//!
//! Latency lines go to `--output` (`-` for stdout); diagnostics go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hnsw_ingest::bench::{self, BenchSummary};
use hnsw_ingest::config::{BenchConfig, Space};
use hnsw_ingest::report::Reporter;
use hnsw_ingest::tensor::Distribution;
use hnsw_ingest::{Cosine, InnerProduct, Metric, L2};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SpaceArg {
    Ip,
    Cosine,
    L2,
}

impl From<SpaceArg> for Space {
    fn from(value: SpaceArg) -> Self {
        match value {
            SpaceArg::Ip => Space::InnerProduct,
            SpaceArg::Cosine => Space::Cosine,
            SpaceArg::L2 => Space::L2,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DistributionArg {
    Normal,
    Uniform,
}

impl From<DistributionArg> for Distribution {
    fn from(value: DistributionArg) -> Self {
        match value {
            DistributionArg::Normal => Distribution::StandardNormal,
            DistributionArg::Uniform => Distribution::Uniform,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "hnsw-ingest",
    version,
    about = "Generate random vector batches and time their insertion into an HNSW index."
)]
struct Args {
    /// Report file; `-` writes to stdout.
    #[arg(short, long, default_value = "a.log")]
    output: PathBuf,

    #[arg(long, default_value_t = 128)]
    dim: usize,

    /// Vectors per phase.
    #[arg(long, default_value_t = 128_000)]
    num_elements: usize,

    /// Batches the first phase is split into.
    #[arg(long, default_value_t = 128)]
    chunks: usize,

    #[arg(long, default_value_t = 1_000_000)]
    max_elements: usize,

    #[arg(short, long, default_value_t = 90)]
    m: usize,

    #[arg(long = "ef-construction", default_value_t = 200)]
    ef_construction: usize,

    /// Query breadth.
    #[arg(long, default_value_t = 100)]
    ef: usize,

    #[arg(long, value_enum, default_value_t = SpaceArg::Ip)]
    space: SpaceArg,

    #[arg(long, value_enum, default_value_t = DistributionArg::Normal)]
    distribution: DistributionArg,

    /// Seed for data and graph levels; omit for a fresh run.
    #[arg(long)]
    seed: Option<u64>,

    /// Full-phase vectors to search back after insertion (0 = skip).
    #[arg(long, default_value_t = 0)]
    recall_queries: usize,
}

impl From<Args> for BenchConfig {
    fn from(a: Args) -> Self {
        BenchConfig {
            output: a.output,
            dim: a.dim,
            num_elements: a.num_elements,
            chunks: a.chunks,
            max_elements: a.max_elements,
            m: a.m,
            ef_construction: a.ef_construction,
            ef: a.ef,
            space: a.space.into(),
            distribution: a.distribution.into(),
            seed: a.seed,
            recall_queries: a.recall_queries,
        }
    }
}

fn run_with<M: Metric>(cfg: &BenchConfig, metric: M) -> Result<BenchSummary> {
    let mut index = cfg.builder(metric).build();
    let mut reporter = Reporter::open(&cfg.output)
        .with_context(|| format!("opening report file {}", cfg.output.display()))?;

    let summary = bench::run(cfg, &mut index, &mut reporter).context("ingest run failed")?;
    reporter.finish().context("flushing report")?;

    info!(levels = ?index.level_sizes(), "graph shape");
    Ok(summary)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cfg = BenchConfig::from(Args::parse());
    cfg.validate().context("invalid configuration")?;
    info!(
        space = ?cfg.space,
        dim = cfg.dim,
        m = cfg.m,
        ef_construction = cfg.ef_construction,
        max_elements = cfg.max_elements,
        "index configured"
    );

    let summary = match cfg.space {
        Space::InnerProduct => run_with(&cfg, InnerProduct)?,
        Space::Cosine => run_with(&cfg, Cosine)?,
        Space::L2 => run_with(&cfg, L2)?,
    };

    info!(
        calls = summary.timings.len(),
        inserted = summary.inserted,
        index_len = summary.index_len,
        total_secs = summary.total_elapsed().as_secs_f64(),
        recall = ?summary.recall,
        "done"
    );
    Ok(())
}
