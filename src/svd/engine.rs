//! Singular value decomposition of channel matrices.
//!
//! The decomposition numerics come from `nalgebra`; this module pins down the
//! shapes and ordering the rest of the pipeline relies on:
//!
//! - `u` is `rows × r`
//! - `sigma` has length `r`, non-negative and non-increasing
//! - `v` is `cols × r`
//!
//! where `r = min(rows, cols)` and `u · diag(sigma) · vᵗ ≈ M`.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use crate::data::ChannelMatrix;
use crate::error::{Result, SvdError};

/// Thin SVD of a channel matrix.
#[derive(Debug, Clone)]
pub struct Factorization {
    /// Left singular vectors, `rows × r`
    pub u: Array2<f64>,
    /// Singular values in descending order, length `r`
    pub sigma: Array1<f64>,
    /// Right singular vectors, `cols × r`
    pub v: Array2<f64>,
}

impl Factorization {
    /// Number of singular values, `min(rows, cols)`.
    pub fn rank(&self) -> usize {
        self.sigma.len()
    }

    /// Shape `(rows, cols)` of the factored matrix.
    pub fn shape(&self) -> (usize, usize) {
        (self.u.nrows(), self.v.nrows())
    }

    /// Fraction of the total energy (sum of squared singular values)
    /// captured by the first `k` modes.
    pub fn energy_fraction(&self, k: usize) -> f64 {
        let total: f64 = self.sigma.iter().map(|s| s * s).sum();
        if total == 0.0 {
            return 1.0;
        }
        let kept: f64 = self.sigma.iter().take(k).map(|s| s * s).sum();
        kept / total
    }
}

/// A dense SVD backend.
///
/// Implementations must honor the shape and ordering contract documented at
/// the module level.
pub trait SvdEngine: Send + Sync {
    /// Unique identifier for this engine (e.g. "nalgebra").
    fn id(&self) -> &'static str;

    /// Decompose `matrix` into `u · diag(sigma) · vᵗ`.
    fn decompose(&self, matrix: &ChannelMatrix) -> Result<Factorization>;
}

/// SVD engine backed by `nalgebra`'s one-sided bidiagonalization solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraSvd;

impl SvdEngine for NalgebraSvd {
    fn id(&self) -> &'static str {
        "nalgebra"
    }

    fn decompose(&self, matrix: &ChannelMatrix) -> Result<Factorization> {
        let (rows, cols) = matrix.shape();
        if rows == 0 || cols == 0 {
            return Err(SvdError::EmptyImage);
        }

        let array = matrix.as_array();
        let m = DMatrix::from_fn(rows, cols, |i, j| array[(i, j)]);
        let svd = m.svd(true, true);

        let u = svd
            .u
            .ok_or_else(|| SvdError::decomposition("left singular vectors not computed"))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| SvdError::decomposition("right singular vectors not computed"))?;
        let singular_values = svd.singular_values;
        let r = singular_values.len();

        if r != rows.min(cols) || u.shape() != (rows, r) || v_t.shape() != (r, cols) {
            return Err(SvdError::decomposition(format!(
                "unexpected factor shapes: u={:?}, sigma={}, v_t={:?} for {}x{} matrix",
                u.shape(),
                r,
                v_t.shape(),
                rows,
                cols
            )));
        }

        // Descending order is part of the contract, so enforce it here rather
        // than rely on the solver's own sorting.
        let mut order: Vec<usize> = (0..r).collect();
        order.sort_by(|&a, &b| singular_values[b].total_cmp(&singular_values[a]));

        let sigma = Array1::from_shape_fn(r, |k| singular_values[order[k]].max(0.0));
        let u = Array2::from_shape_fn((rows, r), |(i, k)| u[(i, order[k])]);
        let v = Array2::from_shape_fn((cols, r), |(j, k)| v_t[(order[k], j)]);

        log::trace!(
            "nalgebra SVD of {}x{} matrix: sigma[0]={:.4}, sigma[{}]={:.4}",
            rows,
            cols,
            sigma[0],
            r - 1,
            sigma[r - 1]
        );

        Ok(Factorization { u, sigma, v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(f: &Factorization) -> Array2<f64> {
        let scaled = &f.u * &f.sigma;
        scaled.dot(&f.v.t())
    }

    #[test]
    fn test_factor_shapes_tall() {
        let m = ChannelMatrix::from_fn(6, 4, |x, y| f64::from(x + 2 * y) / 20.0);
        let f = NalgebraSvd.decompose(&m).expect("svd");
        assert_eq!(f.rank(), 4);
        assert_eq!(f.u.dim(), (6, 4));
        assert_eq!(f.v.dim(), (4, 4));
        assert_eq!(f.shape(), (6, 4));
    }

    #[test]
    fn test_factor_shapes_wide() {
        let m = ChannelMatrix::from_fn(3, 7, |x, y| f64::from((x * 7 + y) % 5) / 4.0);
        let f = NalgebraSvd.decompose(&m).expect("svd");
        assert_eq!(f.rank(), 3);
        assert_eq!(f.u.dim(), (3, 3));
        assert_eq!(f.v.dim(), (7, 3));
    }

    #[test]
    fn test_singular_values_descending_non_negative() {
        let m = ChannelMatrix::from_fn(8, 5, |x, y| ((x * 31 + y * 17) % 11) as f64 / 10.0);
        let f = NalgebraSvd.decompose(&m).expect("svd");
        for s in f.sigma.iter() {
            assert!(*s >= 0.0);
        }
        for pair in f.sigma.as_slice().expect("contiguous").windows(2) {
            assert!(pair[0] >= pair[1], "sigma not sorted: {:?}", f.sigma);
        }
    }

    #[test]
    fn test_product_reconstructs_matrix() {
        let m = ChannelMatrix::from_fn(5, 6, |x, y| ((x * 3 + y * 5) % 7) as f64 / 6.0);
        let f = NalgebraSvd.decompose(&m).expect("svd");
        let back = ChannelMatrix::from_array(product(&f));
        let diff = m.max_abs_diff(&back).expect("same shape");
        assert!(diff < 1e-9, "reconstruction error {}", diff);
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let m = ChannelMatrix::from_array(Array2::zeros((0, 4)));
        assert!(matches!(
            NalgebraSvd.decompose(&m),
            Err(SvdError::EmptyImage)
        ));
    }

    #[test]
    fn test_energy_fraction() {
        let f = Factorization {
            u: Array2::eye(2),
            sigma: Array1::from(vec![4.0, 3.0]),
            v: Array2::eye(2),
        };
        // 16 / (16 + 9)
        assert!((f.energy_fraction(1) - 0.64).abs() < 1e-12);
        assert!((f.energy_fraction(2) - 1.0).abs() < 1e-12);
    }
}
