use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImage, GrayImage, Rgb, RgbImage};
use tracing::info;

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

// Sets the pixel color, silently ignoring coordinates outside the image.
// Returns whether the pixel was written.
pub fn set_pixel<I: GenericImage>(image: &mut I, x: i32, y: i32, color: I::Pixel) -> bool {
    let (width, height) = image.dimensions();
    if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
        return false;
    }
    image.put_pixel(x as u32, y as u32, color);
    true
}

/// Scales every channel by `intensity`, clamped to `[0, 1]`. The fraction
/// is truncated.
pub fn scale(color: Rgb<u8>, intensity: f32) -> Rgb<u8> {
    let intensity = intensity.max(0.).min(1.);
    let Rgb([r, g, b]) = color;
    let channel = |c: u8| (f32::from(c) * intensity) as u8;
    Rgb([channel(r), channel(g), channel(b)])
}

/// Uniform gray of the given intensity.
pub fn gray(intensity: f32) -> Rgb<u8> {
    scale(WHITE, intensity)
}

// Flip vertically to make origin at bottom left, then write.
fn save(image: DynamicImage, dir: &Path, stem: &str, extension: &str) -> Result<PathBuf> {
    let path = dir.join(format!("{}.{}", stem, extension));
    image
        .flipv()
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote image");
    Ok(path)
}

pub fn save_rgb(image: RgbImage, dir: &Path, stem: &str, extension: &str) -> Result<PathBuf> {
    save(DynamicImage::ImageRgb8(image), dir, stem, extension)
}

pub fn save_gray(image: GrayImage, dir: &Path, stem: &str, extension: &str) -> Result<PathBuf> {
    save(DynamicImage::ImageLuma8(image), dir, stem, extension)
}
