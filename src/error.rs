//! Error types for the SVD compression pipeline.

use thiserror::Error;

use crate::data::Channel;

/// Errors that can occur while decomposing or reconstructing an image.
#[derive(Error, Debug)]
pub enum SvdError {
    /// A non-color selector (e.g. `Channel::All`) was used where a single
    /// color channel is required. Indicates misuse by the caller.
    #[error("Can't get matrix for channel selector '{channel}'")]
    InvalidChannelSelector {
        /// The selector that was rejected
        channel: Channel,
    },

    /// Channel images being combined do not share the same dimensions
    #[error(
        "Dimension mismatch in {channel} channel: expected {}x{}, found {}x{}",
        expected.0, expected.1, found.0, found.1
    )]
    DimensionMismatch {
        /// The channel whose image had the wrong size
        channel: Channel,
        /// Expected (width, height)
        expected: (u32, u32),
        /// Actual (width, height)
        found: (u32, u32),
    },

    /// Requested mode count is outside `[1, max]`
    #[error("Mode count {requested} out of range, must be between 1 and {max}")]
    ModeCountOutOfRange {
        /// The requested number of modes
        requested: usize,
        /// Largest valid mode count, `min(width, height)`
        max: usize,
    },

    /// The input image or matrix has zero width or height
    #[error("Image has no pixels")]
    EmptyImage,

    /// The SVD engine failed to produce a factorization
    #[error("Decomposition failed: {0}")]
    Decomposition(String),

    /// Image bytes could not be decoded or encoded
    #[error("Image codec error: {0}")]
    Decode(#[from] image::ImageError),

    /// File is not in one of the supported image formats
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// I/O error while reading or writing image files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A reconstruction was requested before any image was decomposed
    #[error("No image has been loaded")]
    NoImageLoaded,

    /// The request was superseded before it finished
    #[error("Computation cancelled by a newer request")]
    Cancelled,
}

impl SvdError {
    /// Create a mode count error.
    pub fn mode_out_of_range(requested: usize, max: usize) -> Self {
        Self::ModeCountOutOfRange { requested, max }
    }

    /// Create a decomposition error with a message.
    pub fn decomposition(message: impl Into<String>) -> Self {
        Self::Decomposition(message.into())
    }

    /// Whether the caller can reasonably retry or report this error to a user.
    ///
    /// Selector misuse is a programming error and is the only
    /// non-recoverable kind.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidChannelSelector { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = SvdError> = std::result::Result<T, E>;
