//! Image-side data types and the codec boundary.
//!
//! This module provides:
//! - `Channel`: color channel selector shared by extraction and previews
//! - `ChannelMatrix`: normalized `(width, height)` intensity matrix of one channel
//! - `codec`: decoding/encoding of image bytes via the `image` crate

mod channel;
pub mod codec;
mod matrix;

pub use channel::Channel;
pub use matrix::{ChannelMatrix, MAX_INTENSITY};
