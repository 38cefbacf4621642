//! math.rs — pluggable distance metrics for the index.
//!
//! * `Metric` trait abstracts over inner product / cosine / L2.
//! * Optional AVX2 fast-path behind `--features simd` and
//!   `RUSTFLAGS="-C target-cpu=native"` on x86_64.

/// Blanket trait — all metrics must return **smaller = closer** distance.
pub trait Metric: Send + Sync + 'static {
    /// Short name as accepted on the command line (`ip`, `cosine`, `l2`).
    const NAME: &'static str;

    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

/// Sum of `a[i] * b[i]`.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut acc = 0.0_f32;
    let mut i = 0usize;

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    unsafe {
        use std::arch::x86_64::*;
        if is_x86_feature_detected!("avx2") {
            while i + 8 <= a.len() {
                let va = _mm256_loadu_ps(a.as_ptr().add(i));
                let vb = _mm256_loadu_ps(b.as_ptr().add(i));
                acc += _mm256_reduce_add_ps(_mm256_mul_ps(va, vb));
                i += 8;
            }
        }
    }

    while i < a.len() {
        acc += a[i] * b[i];
        i += 1;
    }
    acc
}

/// AVX2 helper: horizontal sum of 8-lane register.
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[inline]
unsafe fn _mm256_reduce_add_ps(v: std::arch::x86_64::__m256) -> f32 {
    use std::arch::x86_64::*;
    let hi = _mm256_extractf128_ps(v, 1);
    let lo = _mm256_castps256_ps128(v);
    let sum128 = _mm_add_ps(lo, hi);
    let hi64 = _mm_movehl_ps(sum128, sum128);
    let sum64 = _mm_add_ps(sum128, hi64);
    let shuf = _mm_movehdup_ps(sum64);
    let result = _mm_add_ss(sum64, shuf);
    _mm_cvtss_f32(result)
}

// ----------------------------------------------------------------------
// Inner-product distance — returns 1 – dot(a, b)
// Matches the "ip" space of the usual HNSW libraries; can go negative
// for unnormalised inputs, which is fine for ranking.
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct InnerProduct;

impl Metric for InnerProduct {
    const NAME: &'static str = "ip";

    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        1.0 - dot(a, b)
    }
}

// ----------------------------------------------------------------------
// Cosine distance  — returns  1 – cos(θ)  ∈ [0, 2]
// Robust to unnormalised inputs; if either vector is zero → 1.0.
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl Metric for Cosine {
    const NAME: &'static str = "cosine";

    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        let d = dot(a, b);
        let na = dot(a, a);
        let nb = dot(b, b);
        if na == 0.0 || nb == 0.0 {
            return 1.0; // degenerate
        }
        let denom = (na.sqrt() * nb.sqrt()).max(1e-12);
        let cos = (d / denom).clamp(-1.0, 1.0);
        1.0 - cos
    }
}

/// Squared Euclidean distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2;

impl Metric for L2 {
    const NAME: &'static str = "l2";

    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        a.iter()
            .zip(b)
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum()
    }
}
