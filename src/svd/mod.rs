//! Rank-truncated SVD image reconstruction.
//!
//! The stages, leaves first:
//! - [`extract`]: RGB image to a normalized `(width, height)` channel matrix
//! - [`engine`]: SVD backend behind the [`SvdEngine`] trait
//! - [`truncate`]: zero singular values past the requested mode count
//! - [`reconstruct`]: `U·Σ'·Vᵗ` quantized back to an 8-bit channel image
//! - [`combine`]: three channel images to one RGB image
//!
//! [`pipeline`] ties them together and caches factorizations per image so
//! mode count changes skip the expensive decomposition.
//!
//! ```rust,ignore
//! use svd_demo::svd::{compress_image, NalgebraSvd, PipelineOptions};
//!
//! let result = compress_image(&image, 20, &NalgebraSvd, PipelineOptions::default())?;
//! println!("{:.2}x smaller", result.stats().compression_ratio());
//! ```

pub mod cancel;
pub mod combine;
pub mod engine;
pub mod extract;
pub mod pipeline;
pub mod reconstruct;
pub mod stats;
pub mod truncate;

#[cfg(test)]
mod tests;

pub use cancel::{CancelToken, GenerationCounter};
pub use combine::{combine_channels, tint_channel};
pub use engine::{Factorization, NalgebraSvd, SvdEngine};
pub use extract::{extract_channel, extract_with_preview, isolate_channel};
pub use pipeline::{
    ChannelDecomposition, DecomposedImage, ModePolicy, PipelineOptions, Reconstruction,
    compress_image,
};
pub use reconstruct::{quantize, reconstruct_channel, reconstruct_matrix};
pub use stats::{CompressionStats, max_abs_error, mean_squared_error, psnr};
pub use truncate::{truncate_singular_values, validate_modes};
