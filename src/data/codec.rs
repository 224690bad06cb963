//! Image codec boundary (JPEG, PNG, BMP, TIFF, WebP).
//!
//! Decoding and encoding are delegated to the `image` crate; the rest of the
//! crate only ever sees decoded `RgbImage` values.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};

use crate::error::{Result, SvdError};

/// File extensions accepted by the codec (lowercase, without dots).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Default JPEG quality; reconstructions are encoded at full quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Check if a filename has a supported image extension.
pub fn is_supported_file(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}

/// Check common image magic bytes.
///
/// Returns `true` if the data looks like an image this codec can decode.
pub fn can_load(data: &[u8]) -> bool {
    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return true;
    }

    if data.len() < 8 {
        return false;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return true;
    }

    // BMP: 42 4D (BM)
    if data.starts_with(&[0x42, 0x4D]) {
        return true;
    }

    // TIFF: 49 49 2A 00 (little endian) or 4D 4D 00 2A (big endian)
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return true;
    }

    // WebP: RIFF....WEBP
    data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP"
}

/// Decode raw image bytes into an 8-bit RGB image.
///
/// Alpha, if present, is discarded.
pub fn decode_image(data: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(data)?.to_rgb8();
    log::trace!(
        "Decoded {} bytes into {}x{} RGB image",
        data.len(),
        img.width(),
        img.height()
    );
    Ok(img)
}

/// Open and decode an image file.
///
/// Files whose contents don't start with a known image signature are
/// rejected before decoding, whatever their extension.
pub fn open_image(path: &Path) -> Result<RgbImage> {
    let bytes = std::fs::read(path)?;
    if !can_load(&bytes) {
        return Err(SvdError::UnsupportedFormat(path.display().to_string()));
    }
    decode_image(&bytes)
}

/// Check that `path` has an extension [`save_image`] can write.
pub fn check_output_path(path: &Path) -> Result<()> {
    if is_supported_file(&path.to_string_lossy()) {
        Ok(())
    } else {
        Err(SvdError::UnsupportedFormat(path.display().to_string()))
    }
}

/// Encode an RGB image as JPEG with the given quality (1-100).
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder.encode_image(image)?;
    Ok(buffer)
}

/// Encode an RGB image as PNG (lossless).
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

/// Save an image, picking the format from the file extension.
///
/// JPEG output uses `quality`; other formats ignore it.
pub fn save_image(image: &RgbImage, path: &Path, quality: u8) -> Result<()> {
    check_output_path(path)?;
    let format = ImageFormat::from_path(path)?;
    if format == ImageFormat::Jpeg {
        let bytes = encode_jpeg(image, quality)?;
        std::fs::write(path, bytes)?;
    } else {
        image.save_with_format(path, format)?;
    }
    log::debug!("Saved {}x{} image to {:?}", image.width(), image.height(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("svd-demo-codec-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_magic_detection_png() {
        let png_magic = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(can_load(&png_magic));
    }

    #[test]
    fn test_magic_detection_jpeg() {
        let jpeg_magic = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert!(can_load(&jpeg_magic));
    }

    #[test]
    fn test_magic_detection_invalid() {
        let random_data = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        assert!(!can_load(&random_data));
    }

    #[test]
    fn test_is_supported_file() {
        assert!(is_supported_file("photo.jpg"));
        assert!(is_supported_file("PHOTO.JPEG")); // case insensitive
        assert!(is_supported_file("scan.png"));
        assert!(!is_supported_file("document.pdf"));
    }

    #[test]
    fn test_png_roundtrip_is_lossless() {
        let img = RgbImage::from_fn(7, 5, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 99]));
        let bytes = encode_png(&img).expect("encode png");
        assert!(can_load(&bytes));
        let decoded = decode_image(&bytes).expect("decode png");
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_jpeg_encode_preserves_dimensions() {
        let img = RgbImage::from_fn(16, 8, |x, _| Rgb([(x * 16) as u8, 128, 64]));
        let bytes = encode_jpeg(&img, DEFAULT_JPEG_QUALITY).expect("encode jpeg");
        assert!(bytes.starts_with(&[0xFF, 0xD8, 0xFF]));
        let decoded = decode_image(&bytes).expect("decode jpeg");
        assert_eq!(decoded.dimensions(), (16, 8));
    }

    #[test]
    fn test_open_rejects_non_image_file() {
        let path = temp_path("notes.png");
        std::fs::write(&path, b"plain text, not pixels").expect("write");
        let result = open_image(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(SvdError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_save_and_open_png() {
        let path = temp_path("small.png");
        let img = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 7]));
        save_image(&img, &path, DEFAULT_JPEG_QUALITY).expect("save");
        let opened = open_image(&path).expect("open");
        let _ = std::fs::remove_file(&path);
        assert_eq!(opened, img);
    }

    #[test]
    fn test_save_rejects_unsupported_extension() {
        let path = temp_path("out.pdf");
        let img = RgbImage::new(2, 2);
        assert!(matches!(
            save_image(&img, &path, DEFAULT_JPEG_QUALITY),
            Err(SvdError::UnsupportedFormat(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_image(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(SvdError::Decode(_))));
    }
}
