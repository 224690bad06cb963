//! svd-demo - Rank-truncated SVD image compression
//!
//! Splits an RGB image into normalized channel matrices, factors each with a
//! singular value decomposition, keeps the `k` largest modes and rebuilds the
//! image. See [`svd`] for the pipeline and [`state`] for the background
//! worker used by interactive front ends.

pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod state;
pub mod svd;
pub mod test_image;

pub use config::{AppConfig, ConfigError};
pub use data::{Channel, ChannelMatrix};
pub use error::{Result, SvdError};
pub use state::{ReconstructionWorker, RequestKind, WorkerResult};
pub use svd::{
    DecomposedImage, ModePolicy, NalgebraSvd, PipelineOptions, Reconstruction, compress_image,
};
