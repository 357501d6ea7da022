#![warn(missing_docs)]
//! # fitframe-compress
//!
//! ## Purpose
//! Implements the adaptive size-bounded JPEG compressor for customer images.
//!
//! ## Responsibilities
//! - Decode uploaded file bodies into validated raw images.
//! - Iteratively re-encode a raw image until it fits the transport budget.
//! - Expose the deterministic tightening schedule for verification.
//!
//! ## Data flow
//! Upload bytes or a camera frame -> [`RawImage`] -> [`compress`] ->
//! [`CompressedImage`] consumed by the widget as the customer image.
//!
//! ## Ownership and lifetimes
//! The compressor borrows the raw image and returns an owned encoding, so the
//! caller controls when the raw pixel buffer is dropped.
//!
//! ## Error model
//! Zero-area inputs and codec failures are reported as [`CompressError`]
//! values; once validation passes, the loop itself never fails. Exhausting
//! every pass returns the last encoding as a best effort.
//!
//! ## Security and privacy notes
//! Pixel bytes are never logged; only sizes and schedule parameters are.

use std::io::Cursor;

use fitframe_core::{CompressedImage, CoreError, ImageSource, RawImage};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbaImage;
use thiserror::Error;

/// Encoded-size ceiling in bytes (2 MiB).
pub const TARGET_ENCODED_BYTES: usize = 2 * 1024 * 1024;

/// JPEG quality used by the first pass.
pub const INITIAL_QUALITY: f32 = 0.85;

/// Dimension cap used by the first pass, in pixels.
pub const INITIAL_MAX_DIMENSION: u32 = 1400;

/// Quality floor the tightening schedule never crosses.
pub const MIN_QUALITY: f32 = 0.6;

/// Dimension floor the tightening schedule never crosses, in pixels.
pub const MIN_MAX_DIMENSION: u32 = 800;

/// Maximum number of encode passes before returning the best effort.
pub const MAX_PASSES: usize = 5;

/// Compresses one raw image under the transport size budget.
///
/// # Semantics
/// Each pass rescales from the *original* pixels (never from a previous
/// pass's output), encodes at the pass's quality, and stops as soon as the
/// encoded length fits [`TARGET_ENCODED_BYTES`]. A pass that fits is returned
/// as-is; no further tightening occurs. If all [`MAX_PASSES`] passes exceed
/// the budget, the final pass's encoding is returned.
///
/// # Errors
/// Returns [`CompressError::InvalidImage`] for zero-area input before the
/// loop begins. Returns [`CompressError::Encode`] when the JPEG encoder
/// fails, which is not expected for validated input.
pub fn compress(raw: &RawImage) -> Result<CompressedImage, CompressError> {
    if raw.is_zero_area() {
        return Err(CompressError::InvalidImage(
            "image has a zero dimension".to_string(),
        ));
    }

    let source_pixels = RgbaImage::from_raw(raw.width, raw.height, raw.rgba.clone())
        .ok_or_else(|| CompressError::InvalidImage("pixel buffer shape mismatch".to_string()))?;

    let mut quality = INITIAL_QUALITY;
    let mut max_dimension = INITIAL_MAX_DIMENSION;
    let mut last: Option<CompressedImage> = None;

    for pass in 0..MAX_PASSES {
        let (width, height) = fit_dimensions(raw.width, raw.height, max_dimension);
        let jpeg = encode_pass(&source_pixels, width, height, quality)?;
        let encoded_len = jpeg.len();

        let candidate = CompressedImage {
            jpeg,
            width,
            height,
            quality,
            max_dimension,
            source: raw.source,
        };

        if encoded_len <= TARGET_ENCODED_BYTES {
            log::debug!(
                "compression converged on pass {pass}: {encoded_len} bytes at q={quality:.2} dim<={max_dimension}"
            );
            return Ok(candidate);
        }

        last = Some(candidate);
        (quality, max_dimension) = next_parameters(quality, max_dimension);
    }

    log::debug!("compression exhausted {MAX_PASSES} passes, returning best effort");
    // Loop body ran at least once, so `last` is populated here.
    last.ok_or_else(|| CompressError::Encode("no encode pass produced output".to_string()))
}

/// Decodes an uploaded image file body into a raw image tagged `Uploaded`.
///
/// # Errors
/// Returns [`CompressError::Decode`] when the bytes are not a decodable
/// image.
pub fn decode_upload(bytes: &[u8]) -> Result<RawImage, CompressError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|error| CompressError::Decode(error.to_string()))?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(RawImage::new(
        width,
        height,
        rgba.into_raw(),
        ImageSource::Uploaded,
    )?)
}

/// Computes the pass dimensions for a given cap, preserving aspect ratio.
///
/// # Semantics
/// Images already inside the cap keep their dimensions. Larger images are
/// scaled so the longer side equals `max_dimension`, with the shorter side
/// rounded to the nearest pixel.
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let ratio = (max_dimension as f64 / width as f64).min(max_dimension as f64 / height as f64);
    let scaled_width = ((width as f64) * ratio).round().max(1.0) as u32;
    let scaled_height = ((height as f64) * ratio).round().max(1.0) as u32;
    (scaled_width, scaled_height)
}

/// Advances the tightening schedule by one step.
///
/// # Semantics
/// Quality steps down by 0.1 to a floor of [`MIN_QUALITY`]; the dimension cap
/// shrinks by 15% (rounded) to a floor of [`MIN_MAX_DIMENSION`].
pub fn next_parameters(quality: f32, max_dimension: u32) -> (f32, u32) {
    let next_quality = (quality - 0.1).max(MIN_QUALITY);
    let next_dimension = (((max_dimension as f64) * 0.85).round() as u32).max(MIN_MAX_DIMENSION);
    (next_quality, next_dimension)
}

fn encode_pass(
    source: &RgbaImage,
    width: u32,
    height: u32,
    quality: f32,
) -> Result<Vec<u8>, CompressError> {
    let scaled = if (width, height) == source.dimensions() {
        source.clone()
    } else {
        image::imageops::resize(source, width, height, FilterType::Triangle)
    };

    let rgb = image::DynamicImage::ImageRgba8(scaled).to_rgb8();
    let jpeg_quality = (quality * 100.0).round() as u8;

    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality);
    encoder
        .encode_image(&rgb)
        .map_err(|error| CompressError::Encode(error.to_string()))?;

    Ok(out.into_inner())
}

/// Compression layer error type.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Input violates the compressor precondition (zero area, bad shape).
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// Uploaded bytes are not a decodable image.
    #[error("image decode failure: {0}")]
    Decode(String),
    /// JPEG encoder runtime failure.
    #[error("image encode failure: {0}")]
    Encode(String),
    /// Core model validation error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for convergence, schedule, and geometry behavior.

    use super::*;

    fn gradient_image(width: u32, height: u32) -> RawImage {
        let mut rgba = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128, 255]);
            }
        }
        RawImage::new(width, height, rgba, ImageSource::Uploaded).expect("gradient should be valid")
    }

    #[test]
    fn rejects_zero_area_input_before_encoding() {
        let degenerate = RawImage::new(0, 4, vec![], ImageSource::Uploaded)
            .expect("zero-width shape is self-consistent");
        assert!(matches!(
            compress(&degenerate),
            Err(CompressError::InvalidImage(_))
        ));
    }

    #[test]
    fn small_image_short_circuits_on_first_pass() {
        let raw = gradient_image(320, 240);
        let compressed = compress(&raw).expect("compression should work");

        assert_eq!(compressed.quality, INITIAL_QUALITY);
        assert_eq!(compressed.max_dimension, INITIAL_MAX_DIMENSION);
        assert_eq!((compressed.width, compressed.height), (320, 240));
        assert!(compressed.byte_len() <= TARGET_ENCODED_BYTES);
    }

    #[test]
    fn oversized_upload_converges_under_budget_within_cap() {
        // Mirrors a 6000x4000 phone photo; the gradient content encodes well,
        // so the first pass must already fit the 2 MiB ceiling.
        let raw = gradient_image(6000, 4000);
        let compressed = compress(&raw).expect("compression should work");

        assert!(compressed.byte_len() <= TARGET_ENCODED_BYTES);
        assert!(compressed.width.max(compressed.height) <= INITIAL_MAX_DIMENSION);
        assert_eq!((compressed.width, compressed.height), (1400, 933));
    }

    #[test]
    fn tightening_schedule_matches_fixed_sequence() {
        let mut quality = INITIAL_QUALITY;
        let mut max_dimension = INITIAL_MAX_DIMENSION;
        let mut observed = Vec::new();

        for _ in 0..4 {
            (quality, max_dimension) = next_parameters(quality, max_dimension);
            observed.push(((quality * 100.0).round() as u32, max_dimension));
        }

        assert_eq!(observed, vec![(75, 1190), (65, 1012), (60, 860), (60, 800)]);
    }

    #[test]
    fn fit_dimensions_preserves_aspect_ratio() {
        assert_eq!(fit_dimensions(6000, 4000, 1400), (1400, 933));
        assert_eq!(fit_dimensions(4000, 6000, 1400), (933, 1400));
        assert_eq!(fit_dimensions(800, 600, 1400), (800, 600));
    }

    #[test]
    fn decode_upload_tags_source_as_uploaded() {
        let raw = gradient_image(8, 8);
        let compressed = compress(&raw).expect("compression should work");
        let decoded = decode_upload(&compressed.jpeg).expect("jpeg should decode");

        assert_eq!(decoded.source, ImageSource::Uploaded);
        assert_eq!((decoded.width, decoded.height), (8, 8));
    }
}
