//! Channel extraction: RGB image to normalized intensity matrix.

use image::RgbImage;

use crate::data::{Channel, ChannelMatrix, MAX_INTENSITY};
use crate::error::{Result, SvdError};

/// Resolve `channel` to an RGB component index, rejecting `Channel::All`.
fn component_index(channel: Channel) -> Result<usize> {
    channel.index().ok_or_else(|| {
        log::error!("Can't get matrix for channel selector '{}'", channel);
        SvdError::InvalidChannelSelector { channel }
    })
}

/// Build the normalized matrix of one color channel.
///
/// Entry `(x, y)` is `intensity(x, y) / 255`. The matrix owns its data and
/// the source image is left untouched.
pub fn extract_channel(image: &RgbImage, channel: Channel) -> Result<ChannelMatrix> {
    let component = component_index(channel)?;
    let matrix = ChannelMatrix::from_fn(image.width(), image.height(), |x, y| {
        f64::from(image.get_pixel(x, y)[component]) / MAX_INTENSITY
    });

    log::trace!(
        "Extracted {} channel as {}x{} matrix",
        channel,
        matrix.width(),
        matrix.height()
    );

    Ok(matrix)
}

/// Copy of `image` with every channel except `channel` zeroed.
///
/// Used for split-view previews of the source image.
pub fn isolate_channel(image: &RgbImage, channel: Channel) -> Result<RgbImage> {
    let component = component_index(channel)?;
    Ok(RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let mut pixel = *image.get_pixel(x, y);
        for (i, value) in pixel.0.iter_mut().enumerate() {
            if i != component {
                *value = 0;
            }
        }
        pixel
    }))
}

/// Extract the channel matrix and the isolated preview image together.
pub fn extract_with_preview(
    image: &RgbImage,
    channel: Channel,
) -> Result<(ChannelMatrix, RgbImage)> {
    let matrix = extract_channel(image, channel)?;
    let preview = isolate_channel(image, channel)?;
    Ok((matrix, preview))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn sample_image() -> RgbImage {
        RgbImage::from_fn(4, 3, |x, y| Rgb([(x * 60) as u8, (y * 100) as u8, 255]))
    }

    #[test]
    fn test_extract_normalizes_by_255() {
        let img = sample_image();
        let red = extract_channel(&img, Channel::Red).expect("red");
        assert_eq!(red.shape(), (4, 3));
        assert_eq!(red.get(3, 0), Some(180.0 / 255.0));

        let green = extract_channel(&img, Channel::Green).expect("green");
        assert_eq!(green.get(0, 2), Some(200.0 / 255.0));

        let blue = extract_channel(&img, Channel::Blue).expect("blue");
        assert!(blue.as_array().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_extract_all_fails() {
        let img = sample_image();
        let result = extract_channel(&img, Channel::All);
        assert!(matches!(
            result,
            Err(SvdError::InvalidChannelSelector {
                channel: Channel::All
            })
        ));
    }

    #[test]
    fn test_isolate_zeroes_other_channels() {
        let img = sample_image();
        let green = isolate_channel(&img, Channel::Green).expect("isolate");
        for (x, y, pixel) in green.enumerate_pixels() {
            assert_eq!(pixel.0, [0, img.get_pixel(x, y)[1], 0]);
        }
        assert!(isolate_channel(&img, Channel::All).is_err());
    }

    #[test]
    fn test_extraction_does_not_mutate_source() {
        let img = sample_image();
        let before = img.clone();
        let (_, preview) = extract_with_preview(&img, Channel::Red).expect("extract");
        assert_eq!(img, before);
        assert_ne!(preview, before);
    }
}
