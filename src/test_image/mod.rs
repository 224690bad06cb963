//! Test image generation.
//!
//! Provides deterministic synthetic RGB images for tests and for running the
//! demo without an input file. Every channel carries a different pattern so
//! none of them is a rank-1 matrix.

use image::{Rgb, RgbImage};

/// Generate a test image with a distinct pattern per channel:
/// - Red: horizontal gradient blended with a checkerboard
/// - Green: concentric rings
/// - Blue: noise-like pattern over a vertical gradient
pub fn generate_test_image(width: u32, height: u32) -> RgbImage {
    log::debug!("Generating {}x{} test image", width, height);
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            to_intensity(red_pixel(x, y, width)),
            to_intensity(green_pixel(x, y, width, height)),
            to_intensity(blue_pixel(x, y, height)),
        ])
    })
}

fn to_intensity(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn red_pixel(x: u32, y: u32, width: u32) -> f32 {
    let fx = x as f32 / width.max(1) as f32;
    let checker = if ((x / 2) + (y / 2)) % 2 == 0 { 1.0 } else { 0.0 };
    0.6 * fx + 0.4 * checker
}

fn green_pixel(x: u32, y: u32, width: u32, height: u32) -> f32 {
    let cx = x as f32 / width.max(1) as f32 - 0.5;
    let cy = y as f32 / height.max(1) as f32 - 0.5;
    let dist = (cx * cx + cy * cy).sqrt();
    (dist * 20.0).sin() * 0.5 + 0.5
}

fn blue_pixel(x: u32, y: u32, height: u32) -> f32 {
    let fy = y as f32 / height.max(1) as f32;
    let noise = ((x as f32 * 12.9898 + y as f32 * 78.233).sin() * 43758.5453)
        .fract()
        .abs();
    noise * 0.5 + fy * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let img = generate_test_image(17, 9);
        assert_eq!(img.dimensions(), (17, 9));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(generate_test_image(8, 8), generate_test_image(8, 8));
    }

    #[test]
    fn test_channels_differ() {
        let img = generate_test_image(16, 16);
        let differing = img.pixels().filter(|p| p[0] != p[1] || p[1] != p[2]).count();
        assert!(differing > 200);
    }
}
