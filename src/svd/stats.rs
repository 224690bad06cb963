//! Storage estimates and reconstruction quality metrics.

use image::RgbImage;

use crate::data::Channel;
use crate::error::{Result, SvdError};

/// Storage comparison between a full channel and its `k`-mode factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionStats {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of retained modes
    pub modes: usize,
}

impl CompressionStats {
    /// Create stats for a `width × height` image truncated to `modes`.
    pub fn new(width: u32, height: u32, modes: usize) -> Self {
        Self {
            width,
            height,
            modes,
        }
    }

    /// Values stored by the full channel matrix.
    pub fn full_values(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Values stored by `k` modes: a `width × k` and a `height × k` factor
    /// plus the `k` singular values.
    pub fn mode_values(&self) -> usize {
        self.modes * (self.width as usize + self.height as usize + 1)
    }

    /// Full size in millions of values.
    pub fn full_megabytes(&self) -> f64 {
        self.full_values() as f64 / 1_000_000.0
    }

    /// Truncated size in millions of values.
    pub fn mode_megabytes(&self) -> f64 {
        self.mode_values() as f64 / 1_000_000.0
    }

    /// `full / truncated`; above 1.0 means the factors are smaller.
    pub fn compression_ratio(&self) -> f64 {
        if self.mode_values() == 0 {
            return f64::INFINITY;
        }
        self.full_values() as f64 / self.mode_values() as f64
    }

    /// Largest mode count for which the factors are still smaller than the
    /// full matrix.
    pub fn break_even_modes(&self) -> usize {
        let per_mode = self.width as usize + self.height as usize + 1;
        self.full_values().saturating_sub(1) / per_mode
    }
}

fn check_same_size(reference: &RgbImage, other: &RgbImage) -> Result<()> {
    if reference.dimensions() != other.dimensions() {
        return Err(SvdError::DimensionMismatch {
            channel: Channel::All,
            expected: reference.dimensions(),
            found: other.dimensions(),
        });
    }
    Ok(())
}

/// Mean squared difference over every RGB sample, in 8-bit intensity units.
pub fn mean_squared_error(reference: &RgbImage, other: &RgbImage) -> Result<f64> {
    check_same_size(reference, other)?;
    let samples = reference.as_raw().len();
    if samples == 0 {
        return Ok(0.0);
    }
    let sum: f64 = reference
        .as_raw()
        .iter()
        .zip(other.as_raw().iter())
        .map(|(&a, &b)| {
            let d = f64::from(a) - f64::from(b);
            d * d
        })
        .sum();
    Ok(sum / samples as f64)
}

/// Peak signal-to-noise ratio in dB. Identical images give infinity.
pub fn psnr(reference: &RgbImage, other: &RgbImage) -> Result<f64> {
    let mse = mean_squared_error(reference, other)?;
    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (255.0 * 255.0 / mse).log10())
}

/// Largest absolute per-sample difference between two images.
pub fn max_abs_error(reference: &RgbImage, other: &RgbImage) -> Result<u8> {
    check_same_size(reference, other)?;
    Ok(reference
        .as_raw()
        .iter()
        .zip(other.as_raw().iter())
        .map(|(&a, &b)| a.abs_diff(b))
        .max()
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_storage_estimates() {
        let stats = CompressionStats::new(1000, 500, 10);
        assert_eq!(stats.full_values(), 500_000);
        assert_eq!(stats.mode_values(), 15_010);
        assert!((stats.full_megabytes() - 0.5).abs() < 1e-12);
        assert!((stats.mode_megabytes() - 0.01501).abs() < 1e-12);
        assert!(stats.compression_ratio() > 33.0);
    }

    #[test]
    fn test_break_even_modes() {
        let stats = CompressionStats::new(100, 100, 1);
        // 10000 values vs k * 201
        assert_eq!(stats.break_even_modes(), 49);
        let at = CompressionStats::new(100, 100, stats.break_even_modes());
        assert!(at.compression_ratio() > 1.0);
    }

    #[test]
    fn test_mse_and_psnr() {
        let a = RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]));
        let b = RgbImage::from_pixel(2, 2, Rgb([12, 20, 30]));
        // one of three samples off by 2 per pixel
        let mse = mean_squared_error(&a, &b).expect("mse");
        assert!((mse - 4.0 / 3.0).abs() < 1e-12);
        assert!(psnr(&a, &b).expect("psnr") > 40.0);
        assert_eq!(psnr(&a, &a).expect("psnr"), f64::INFINITY);
        assert_eq!(max_abs_error(&a, &b).expect("max"), 2);
    }

    #[test]
    fn test_metrics_reject_mismatched_sizes() {
        let a = RgbImage::new(2, 2);
        let b = RgbImage::new(2, 3);
        assert!(mean_squared_error(&a, &b).is_err());
        assert!(max_abs_error(&a, &b).is_err());
    }
}
