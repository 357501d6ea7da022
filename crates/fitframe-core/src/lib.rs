#![warn(missing_docs)]
//! # fitframe-core
//!
//! ## Purpose
//! Defines the pure data model used across the `fitframe` workspace.
//!
//! ## Responsibilities
//! - Represent raw captured/uploaded likeness images and their provenance.
//! - Represent the size-bounded encoded customer image and its wire form.
//! - Represent fit recommendations returned by the try-on service.
//! - Represent the notification events the widget raises for the host shell.
//!
//! ## Data flow
//! Upload decoding or a camera frame grab produces a [`RawImage`]. The
//! compressor consumes it once and emits a [`CompressedImage`], which becomes
//! the customer image referenced by the remote pipeline as a JPEG data URI.
//!
//! ## Ownership and lifetimes
//! Images and notices own their backing buffers (`Vec<u8>`, `String`) to avoid
//! hidden borrow/lifetime coupling between widget lifecycle stages.
//!
//! ## Error model
//! Validation failures (pixel-buffer shape mismatch, malformed data URIs)
//! return [`CoreError`] variants with caller-actionable categorization.
//!
//! ## Security and privacy notes
//! This crate intentionally avoids logging image bytes or session identifiers.
//! Customer images are treated as sensitive and only ever leave the process
//! through the pipeline's explicit wire encoding.
//!
//! ## Example
//! ```rust
//! use fitframe_core::{ImageSource, RawImage};
//!
//! let raw = RawImage::new(2, 2, vec![0; 16], ImageSource::Uploaded).unwrap();
//! assert_eq!(raw.width, 2);
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MIME prefix of the customer-image wire form.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Provenance of a likeness image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// Image came from a file upload.
    Uploaded,
    /// Image was grabbed from a live camera frame.
    Captured,
}

/// One raw likeness image in RGBA row-major layout.
///
/// Produced by upload decoding or a camera frame grab, consumed exactly once
/// by the adaptive compressor and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    /// Source width in pixels.
    pub width: u32,
    /// Source height in pixels.
    pub height: u32,
    /// Raw RGBA pixel buffer (`width * height * 4` bytes).
    pub rgba: Vec<u8>,
    /// Where the image came from.
    pub source: ImageSource,
}

impl RawImage {
    /// Constructs a validated raw image.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidImageShape`] when the pixel buffer length
    /// is not exactly `width * height * 4`.
    pub fn new(
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        source: ImageSource,
    ) -> Result<Self, CoreError> {
        let expected_len = required_rgba_len(width, height)?;
        if rgba.len() != expected_len {
            return Err(CoreError::InvalidImageShape {
                expected: expected_len,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
            source,
        })
    }

    /// Returns `true` when either dimension is zero.
    pub fn is_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// JPEG-encoded customer image produced under the compressor's size budget.
///
/// Carries the quality/dimension parameters of the winning encode pass so the
/// outcome of the tightening schedule stays observable.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    /// Encoded JPEG bytes.
    pub jpeg: Vec<u8>,
    /// Encoded width in pixels.
    pub width: u32,
    /// Encoded height in pixels.
    pub height: u32,
    /// JPEG quality used for the returned encoding, in `(0.0, 1.0]`.
    pub quality: f32,
    /// Dimension cap active for the returned encoding.
    pub max_dimension: u32,
    /// Provenance propagated from the raw image.
    pub source: ImageSource,
}

impl CompressedImage {
    /// Returns encoded byte length.
    pub fn byte_len(&self) -> usize {
        self.jpeg.len()
    }

    /// Encodes the image as a `data:image/jpeg;base64,` URI for transport.
    pub fn to_data_uri(&self) -> String {
        let mut uri = String::from(JPEG_DATA_URI_PREFIX);
        uri.push_str(&BASE64.encode(&self.jpeg));
        uri
    }
}

/// Decodes a JPEG data URI back into encoded bytes.
///
/// # Errors
/// Returns [`CoreError::InvalidDataUri`] when the prefix or base64 payload is
/// malformed.
pub fn jpeg_bytes_from_data_uri(uri: &str) -> Result<Vec<u8>, CoreError> {
    let payload = uri
        .strip_prefix(JPEG_DATA_URI_PREFIX)
        .ok_or_else(|| CoreError::InvalidDataUri("missing jpeg data uri prefix".to_string()))?;

    BASE64
        .decode(payload)
        .map_err(|error| CoreError::InvalidDataUri(format!("invalid base64 payload: {error}")))
}

/// Garment fit classification reported by the try-on service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitKind {
    /// Garment fits as intended.
    Perfect,
    /// Garment is looser than intended.
    Loose,
    /// Garment is tighter than intended.
    Tight,
}

/// Fit recommendation attached to a processed try-on session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Fit classification.
    pub fit: FitKind,
    /// Model confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Alternative size suggestion, when the service has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_size: Option<String>,
    /// Free-form advisory text.
    #[serde(default)]
    pub notes: String,
}

impl Recommendation {
    /// Returns `true` when the confidence score is inside `[0.0, 1.0]`.
    pub fn confidence_in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }
}

/// Severity of one host-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// Informational event (successful completion, photo added).
    Info,
    /// Degraded-but-advancing event (soft fallback).
    Warning,
    /// Blocking event the user must act on.
    Error,
}

/// One structured notification raised by the widget.
///
/// The widget only decides *what* to say; rendering belongs to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Event severity.
    pub kind: NoticeKind,
    /// Human-readable message.
    pub message: String,
}

impl Notice {
    /// Creates an informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    /// Creates a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }

    /// Creates an error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Error type for core domain validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Pixel buffer shape does not match declared geometry.
    #[error("invalid image shape: expected {expected} bytes, got {actual}")]
    InvalidImageShape {
        /// Expected RGBA byte count.
        expected: usize,
        /// Actual RGBA byte count.
        actual: usize,
    },
    /// Data URI prefix or payload is malformed.
    #[error("invalid data uri: {0}")]
    InvalidDataUri(String),
    /// Image geometry cannot be represented in memory.
    #[error("invalid image geometry: {0}")]
    InvalidGeometry(String),
    /// JSON encoding/decoding error.
    #[error("codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

fn required_rgba_len(width: u32, height: u32) -> Result<usize, CoreError> {
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| CoreError::InvalidGeometry("image dimensions overflow".to_string()))?;

    pixels
        .checked_mul(4)
        .ok_or_else(|| CoreError::InvalidGeometry("rgba length overflow".to_string()))
}
