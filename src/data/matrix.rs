//! Normalized per-channel intensity matrices.

use ndarray::Array2;

/// Largest 8-bit intensity, used to normalize pixels into `[0.0, 1.0]`.
pub const MAX_INTENSITY: f64 = u8::MAX as f64;

/// Dense real-valued matrix holding one color channel of an image.
///
/// Shape is `(width, height)`: row index is the pixel x-coordinate and
/// column index is the pixel y-coordinate. Values are normalized
/// intensities, nominally in `[0.0, 1.0]`; reconstructed matrices may
/// overshoot slightly.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMatrix {
    data: Array2<f64>,
}

impl ChannelMatrix {
    /// Wrap an existing `(width, height)` array.
    pub fn from_array(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Build a matrix by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f64) -> Self {
        let data = Array2::from_shape_fn((width as usize, height as usize), |(x, y)| {
            f(x as u32, y as u32)
        });
        Self { data }
    }

    /// Image width (number of rows).
    pub fn width(&self) -> u32 {
        self.data.nrows() as u32
    }

    /// Image height (number of columns).
    pub fn height(&self) -> u32 {
        self.data.ncols() as u32
    }

    /// Matrix shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Maximum number of SVD modes, `min(rows, cols)`.
    pub fn max_modes(&self) -> usize {
        let (rows, cols) = self.shape();
        rows.min(cols)
    }

    /// Value at pixel `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        self.data.get((x as usize, y as usize)).copied()
    }

    /// Borrow the underlying array.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Largest absolute element-wise difference to `other`.
    ///
    /// Returns `None` when the shapes differ.
    pub fn max_abs_diff(&self, other: &ChannelMatrix) -> Option<f64> {
        if self.shape() != other.shape() {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max),
        )
    }
}
