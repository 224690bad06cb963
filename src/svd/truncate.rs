//! Rank truncation of singular values.

use ndarray::Array1;

use crate::error::{Result, SvdError};

/// Check that `k` is a valid mode count for `rank` singular values.
pub fn validate_modes(k: usize, rank: usize) -> Result<()> {
    if k == 0 || k > rank {
        return Err(SvdError::mode_out_of_range(k, rank));
    }
    Ok(())
}

/// Copy of `sigma` with every singular value from index `k` onward set to zero.
///
/// The leading `k` values are kept as-is (no re-normalization), so the
/// approximation loses exactly the energy carried by the dropped modes.
pub fn truncate_singular_values(sigma: &Array1<f64>, k: usize) -> Result<Array1<f64>> {
    validate_modes(k, sigma.len())?;

    let mut truncated = sigma.clone();
    truncated.iter_mut().skip(k).for_each(|s| *s = 0.0);

    log::trace!("Truncated {} singular values to {} modes", sigma.len(), k);
    Ok(truncated)
}
