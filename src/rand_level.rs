//! rand_level.rs — draw random layer for a new HNSW node.
//!
//! Follows the distribution from the original HNSW paper:
//! P(level ≥ l) = `exp(-l / λ)`, where `λ = 1 / ln(M)`.
//!
//! The sampler is the "coin-flip until fail" geometric form with
//! per-step success probability `exp(-1/λ) = 1/M`; the caller owns the
//! RNG so a seeded index builds the same tower every run.
//!
//! ```rust
//! use rand::SeedableRng;
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let lvl = hnsw_ingest::draw_level(16.0, &mut rng);
//! assert!(lvl < 64);
//! ```

use rand::Rng;

#[inline]
pub fn draw_level<R: Rng + ?Sized>(m: f64, rng: &mut R) -> usize {
    debug_assert!(m >= 2.0, "M must be ≥ 2");
    let lambda = 1.0 / m.ln();
    let p = (-1.0 / lambda).exp();
    let mut lvl = 0;
    while rng.gen::<f64>() < p {
        lvl += 1;
    }
    lvl
}
