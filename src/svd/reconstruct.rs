//! Reconstruction of truncated factorizations into 8-bit channel images.
//!
//! Matrix row index maps to pixel x and column index to pixel y, the exact
//! inverse of [`extract_channel`](super::extract::extract_channel).

use image::{GrayImage, Luma};
use ndarray::{Array1, Array2, Axis, Slice};

use super::engine::Factorization;
use super::truncate::truncate_singular_values;
use crate::data::{ChannelMatrix, MAX_INTENSITY};
use crate::error::{Result, SvdError};

/// Multiply `u · diag(sigma) · vᵗ` using a (possibly truncated) `sigma`.
///
/// Columns past the last non-zero singular value contribute nothing and are
/// skipped.
pub fn reconstruct_matrix(
    factorization: &Factorization,
    sigma: &Array1<f64>,
) -> Result<ChannelMatrix> {
    if sigma.len() != factorization.rank() {
        return Err(SvdError::decomposition(format!(
            "expected {} singular values, got {}",
            factorization.rank(),
            sigma.len()
        )));
    }

    let (rows, cols) = factorization.shape();
    let keep = sigma.iter().rposition(|&s| s != 0.0).map_or(0, |p| p + 1);
    if keep == 0 {
        return Ok(ChannelMatrix::from_array(Array2::zeros((rows, cols))));
    }

    let kept = Slice::from(..keep);
    let u = factorization.u.slice_axis(Axis(1), kept);
    let v = factorization.v.slice_axis(Axis(1), kept);
    let scaled = &u * &sigma.slice_axis(Axis(0), kept);
    let product = scaled.dot(&v.t());

    log::trace!(
        "Reconstructed {}x{} matrix from {} of {} modes",
        rows,
        cols,
        keep,
        factorization.rank()
    );

    Ok(ChannelMatrix::from_array(product))
}

/// Map a normalized value to an 8-bit intensity: `round(clamp(v, 0, 1) * 255)`.
pub fn quantize_value(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * MAX_INTENSITY).round() as u8
}

/// Quantize a channel matrix into a single-channel image of the same
/// `(width, height)`.
pub fn quantize(matrix: &ChannelMatrix) -> GrayImage {
    let data = matrix.as_array();
    GrayImage::from_fn(matrix.width(), matrix.height(), |x, y| {
        Luma([quantize_value(data[(x as usize, y as usize)])])
    })
}

/// Truncate to `k` modes, reconstruct and quantize in one step.
pub fn reconstruct_channel(factorization: &Factorization, k: usize) -> Result<GrayImage> {
    let truncated = truncate_singular_values(&factorization.sigma, k)?;
    let matrix = reconstruct_matrix(factorization, &truncated)?;
    Ok(quantize(&matrix))
}
