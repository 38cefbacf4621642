//! tensor.rs — random 4-D tensors and their conversion into insert batches.
//!
//! Tensors are laid out `(outer, inner, elements, dim)`; the benchmark only
//! ever uses `outer = inner = 1` and splits along the element axis.

use ndarray::{Array2, Array4, ArrayBase, Axis, Data, Ix4};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::errors::{IngestError, Result};

/// Row-major `(count, dim)` block of vectors handed to `add_items`.
pub type Batch = Array2<f32>;

/// Axis holding the individual vectors.
pub const ELEMENT_AXIS: usize = 2;

/// Sampling distribution for generated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distribution {
    /// N(0, 1).
    #[default]
    StandardNormal,
    /// U[0, 1).
    Uniform,
}

/// `Some(seed)` gives a reproducible stream, `None` draws from OS entropy.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Generate a tensor of `shape` filled from `dist`.
pub fn random_tensor<R: Rng + ?Sized>(shape: [usize; 4], dist: Distribution, rng: &mut R) -> Array4<f32> {
    match dist {
        Distribution::StandardNormal => {
            Array4::from_shape_simple_fn(shape, || rng.sample::<f32, _>(rand_distr::StandardNormal))
        }
        Distribution::Uniform => Array4::from_shape_simple_fn(shape, || rng.gen::<f32>()),
    }
}

/// Split `tensor` into `chunks` equal slices along `axis` and convert each
/// slice into a [`Batch`].
///
/// Every slice must collapse to two dimensions, i.e. its first two axes
/// must have length 1. Uneven splits are rejected rather than padded.
pub fn split_batches<S>(tensor: &ArrayBase<S, Ix4>, chunks: usize, axis: usize) -> Result<Vec<Batch>>
where
    S: Data<Elem = f32>,
{
    if axis >= 4 {
        return Err(IngestError::shape(format!("axis {axis} out of range for 4-D tensor")));
    }
    if chunks == 0 {
        return Err(IngestError::shape("cannot split into zero chunks"));
    }
    let len = tensor.len_of(Axis(axis));
    if len == 0 || len % chunks != 0 {
        return Err(IngestError::shape(format!(
            "axis {axis} of length {len} does not split into {chunks} equal chunks"
        )));
    }

    tensor
        .axis_chunks_iter(Axis(axis), len / chunks)
        .map(|chunk| to_batch(&chunk))
        .collect()
}

/// Drop the two leading unit axes of a `(1, 1, n, dim)` tensor, returning
/// an owned, standard-layout `(n, dim)` batch.
pub fn to_batch<S>(tensor: &ArrayBase<S, Ix4>) -> Result<Batch>
where
    S: Data<Elem = f32>,
{
    let shape = tensor.shape();
    if shape[0] != 1 || shape[1] != 1 {
        return Err(IngestError::shape(format!(
            "expected leading axes of length 1, got {:?}",
            shape
        )));
    }
    let plane = tensor.index_axis(Axis(0), 0);
    let plane = plane.index_axis(Axis(0), 0);
    Ok(plane.as_standard_layout().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    #[test]
    fn same_seed_same_tensor() {
        let a = random_tensor([1, 1, 16, 4], Distribution::StandardNormal, &mut seeded_rng(Some(47)));
        let b = random_tensor([1, 1, 16, 4], Distribution::StandardNormal, &mut seeded_rng(Some(47)));
        assert_eq!(a, b);
    }

    #[test]
    fn normal_samples_have_unit_moments() {
        let t = random_tensor([1, 1, 20_000, 5], Distribution::StandardNormal, &mut seeded_rng(Some(1)));
        let n = t.len() as f64;
        let mean = t.iter().map(|&x| x as f64).sum::<f64>() / n;
        let var = t.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.02, "mean {mean}");
        assert!((var - 1.0).abs() < 0.03, "var {var}");
    }

    #[test]
    fn uniform_samples_stay_in_unit_interval() {
        let t = random_tensor([2, 1, 100, 3], Distribution::Uniform, &mut seeded_rng(Some(2)));
        assert_eq!(t.shape(), &[2, 1, 100, 3]);
        assert!(t.iter().all(|&x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn splits_along_element_axis() {
        let t = random_tensor([1, 1, 1280, 4], Distribution::Uniform, &mut seeded_rng(Some(3)));
        let batches = split_batches(&t, 128, ELEMENT_AXIS).unwrap();
        assert_eq!(batches.len(), 128);
        for (i, b) in batches.iter().enumerate() {
            assert_eq!(b.dim(), (10, 4));
            assert!(b.is_standard_layout());
            assert_eq!(b.view(), t.slice(s![0, 0, i * 10..(i + 1) * 10, ..]));
        }
    }

    #[test]
    fn uneven_split_fails_loudly() {
        let t = Array4::<f32>::zeros((1, 1, 10, 4));
        assert!(matches!(split_batches(&t, 3, ELEMENT_AXIS), Err(IngestError::Shape(_))));
        assert!(matches!(split_batches(&t, 0, ELEMENT_AXIS), Err(IngestError::Shape(_))));
        assert!(matches!(split_batches(&t, 2, 4), Err(IngestError::Shape(_))));
    }

    #[test]
    fn leading_axes_must_be_unit() {
        let t = Array4::<f32>::zeros((2, 1, 10, 4));
        assert!(matches!(to_batch(&t), Err(IngestError::Shape(_))));
        assert!(matches!(split_batches(&t, 5, ELEMENT_AXIS), Err(IngestError::Shape(_))));
        // Splitting the outer axis itself is fine.
        assert_eq!(split_batches(&t, 2, 0).unwrap().len(), 2);
    }

    #[test]
    fn to_batch_keeps_values() {
        let t = Array4::from_shape_fn((1, 1, 3, 2), |(_, _, r, c)| (r * 2 + c) as f32);
        let b = to_batch(&t).unwrap();
        assert_eq!(b, ndarray::array![[0.0_f32, 1.0], [2.0, 3.0], [4.0, 5.0]]);
    }
}
