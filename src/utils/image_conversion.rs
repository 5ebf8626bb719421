//! Image conversion utilities between encoded payloads, `image` buffers and
//! `ndarray` model inputs.

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops, imageops::FilterType, GrayImage, RgbImage};
use ndarray::Array4;

/// Decode a `data:image/...;base64,` URL (or bare base64) into an RGB frame
///
/// # Errors
///
/// * Returns error if the payload is empty or not valid base64
/// * Returns error if the bytes are not a supported image format
pub fn decode_data_url(data: &str) -> Result<RgbImage> {
    let payload = data.split_once(',').map_or(data, |(_, body)| body).trim();
    if payload.is_empty() {
        return Err(Error::InvalidInput("No image data".to_string()));
    }
    let bytes = STANDARD.decode(payload)?;
    Ok(image::load_from_memory(&bytes)?.to_rgb8())
}

/// Convert a frame to a `size` x `size` grayscale image
#[must_use]
pub fn to_square_grayscale(frame: &RgbImage, size: u32) -> GrayImage {
    let gray = imageops::grayscale(frame);
    if gray.dimensions() == (size, size) {
        gray
    } else {
        imageops::resize(&gray, size, size, FilterType::Triangle)
    }
}

/// Mean absolute per-pixel difference on the 0-255 scale
///
/// # Errors
///
/// Returns error if the images differ in size or are empty
pub fn mean_abs_diff(a: &GrayImage, b: &GrayImage) -> Result<f64> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::InvalidInput(format!(
            "Image size mismatch: {:?} vs {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }
    let count = a.as_raw().len();
    if count == 0 {
        return Err(Error::InvalidInput("Cannot diff empty images".to_string()));
    }
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&p, &q)| u64::from(p.abs_diff(q)))
        .sum();
    Ok(total as f64 / count as f64)
}

/// Mean pixel intensity over all frames, normalized to `[0, 1]`
#[must_use]
pub fn mean_intensity(frames: &[GrayImage]) -> f64 {
    let (sum, count) = frames.iter().fold((0u64, 0usize), |(sum, count), frame| {
        let raw = frame.as_raw();
        (sum + raw.iter().map(|&p| u64::from(p)).sum::<u64>(), count + raw.len())
    });
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64 / 255.0
    }
}

/// Resize a frame and pack it as a `[1, size, size, 3]` (NHWC) tensor in `[0, 1]`
#[must_use]
pub fn rgb_to_nhwc(frame: &RgbImage, size: u32) -> Array4<f32> {
    let resized = imageops::resize(frame, size, size, FilterType::Triangle);
    let side = size as usize;
    Array4::from_shape_fn((1, side, side, 3), |(_, row, col, ch)| {
        f32::from(resized.get_pixel(col as u32, row as u32)[ch]) / 255.0
    })
}

/// Resize a frame and pack it as a `[1, 3, size, size]` (NCHW) tensor in `[0, 1]`
#[must_use]
pub fn rgb_to_nchw(frame: &RgbImage, size: u32) -> Array4<f32> {
    rgb_to_nhwc(frame, size).permuted_axes([0, 3, 1, 2]).as_standard_layout().to_owned()
}
