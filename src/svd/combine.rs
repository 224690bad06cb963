//! Recombination of reconstructed channels into a color image.

use image::{GrayImage, Rgb, RgbImage};

use crate::data::Channel;
use crate::error::{Result, SvdError};

/// Merge three single-channel images into one RGB image.
///
/// All three inputs must have the same dimensions as `red`; anything else is
/// reported as a mismatch rather than cropped or padded.
pub fn combine_channels(red: &GrayImage, green: &GrayImage, blue: &GrayImage) -> Result<RgbImage> {
    let expected = red.dimensions();
    for (channel, image) in [(Channel::Green, green), (Channel::Blue, blue)] {
        if image.dimensions() != expected {
            log::warn!(
                "Cannot combine channels: {} is {:?}, expected {:?}",
                channel,
                image.dimensions(),
                expected
            );
            return Err(SvdError::DimensionMismatch {
                channel,
                expected,
                found: image.dimensions(),
            });
        }
    }

    let (width, height) = expected;
    Ok(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            red.get_pixel(x, y)[0],
            green.get_pixel(x, y)[0],
            blue.get_pixel(x, y)[0],
        ])
    }))
}

/// Render a single-channel image tinted with `channel`'s color.
///
/// `Channel::All` renders plain grayscale.
pub fn tint_channel(image: &GrayImage, channel: Channel) -> RgbImage {
    let tint = channel.tint();
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let value = u16::from(image.get_pixel(x, y)[0]);
        Rgb(tint.map(|t| (value * u16::from(t) / 255) as u8))
    })
}
