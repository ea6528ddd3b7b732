//! Image preprocessing ahead of OCR.
//!
//! Fixed pipeline: decode -> BT.601 grayscale -> 5x5 median denoise ->
//! linear contrast stretch (x1.5, clipped). Output keeps the input size.

use image::{GrayImage, Luma, RgbImage};

use super::ExtractError;

/// Side length of the median filter window.
const MEDIAN_KERNEL: u32 = 5;

/// Contrast gain applied after denoising.
const CONTRAST_ALPHA: f32 = 1.5;

/// Brightness offset applied after denoising.
const CONTRAST_BETA: f32 = 0.0;

/// Decode raw image bytes and produce an OCR-ready grayscale raster.
pub fn normalize(bytes: &[u8]) -> Result<GrayImage, ExtractError> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(normalize_rgb(&decoded.to_rgb8()))
}

/// Run the preprocessing steps on an already-decoded image.
pub fn normalize_rgb(rgb: &RgbImage) -> GrayImage {
    let gray = to_grayscale(rgb);
    let denoised = median_filter(&gray, MEDIAN_KERNEL);
    scale_contrast(&denoised, CONTRAST_ALPHA, CONTRAST_BETA)
}

/// BT.601 luma (0.299 R + 0.587 G + 0.114 B), the weighting OCR tooling
/// conventionally expects.
pub fn to_grayscale(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Median filter over a `kernel` x `kernel` window. Pixels outside the image
/// replicate the nearest edge pixel.
pub fn median_filter(src: &GrayImage, kernel: u32) -> GrayImage {
    let (width, height) = src.dimensions();
    if width == 0 || height == 0 || kernel <= 1 {
        return src.clone();
    }

    let radius = (kernel / 2) as i64;
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;
    let mut window: Vec<u8> = Vec::with_capacity((kernel * kernel) as usize);

    GrayImage::from_fn(width, height, |x, y| {
        window.clear();
        for dy in -radius..=radius {
            let sy = (y as i64 + dy).clamp(0, max_y) as u32;
            for dx in -radius..=radius {
                let sx = (x as i64 + dx).clamp(0, max_x) as u32;
                window.push(src.get_pixel(sx, sy).0[0]);
            }
        }
        let mid = window.len() / 2;
        let (_, median, _) = window.select_nth_unstable(mid);
        Luma([*median])
    })
}

/// `saturate(|src * alpha + beta|)` with round-half-to-even, matching the
/// usual absolute scale conversion.
pub fn scale_contrast(src: &GrayImage, alpha: f32, beta: f32) -> GrayImage {
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let scaled = (value as f32 * alpha + beta).abs().round_ties_even();
        *slot = scaled.clamp(0.0, 255.0) as u8;
    }

    let mut out = src.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    out
}
