//! Core types for image decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::PixelBuffer;

/// Error types for a single decode attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Out of memory during decoding. The only retryable error.
    #[error("Out of memory during decoding")]
    OutOfMemory,

    /// I/O error during file reading.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Filter type for image resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Clockwise rotation needed to display an image upright.
///
/// Only the pure rotations of the EXIF orientation tag are represented;
/// mirrored orientations are treated as `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// No rotation.
    #[default]
    Normal,
    /// Rotate 90 degrees clockwise (EXIF 6).
    Rotate90,
    /// Rotate 180 degrees (EXIF 3).
    Rotate180,
    /// Rotate 270 degrees clockwise (EXIF 8).
    Rotate270,
}

impl Orientation {
    /// Map an EXIF orientation value (1-8) to a rotation.
    /// See: https://exiftool.org/TagNames/EXIF.html
    pub fn from_exif(value: u32) -> Self {
        match value {
            6 => Orientation::Rotate90,
            3 => Orientation::Rotate180,
            8 => Orientation::Rotate270,
            _ => Orientation::Normal,
        }
    }

    /// Map a clockwise angle to a rotation. Angles outside {0, 90, 180, 270}
    /// (after normalizing into 0..360) yield `None`.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Orientation::Normal),
            90 => Some(Orientation::Rotate90),
            180 => Some(Orientation::Rotate180),
            270 => Some(Orientation::Rotate270),
            _ => None,
        }
    }

    /// Clockwise angle in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Orientation::Normal => 0,
            Orientation::Rotate90 => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270 => 270,
        }
    }

    /// Returns true if this rotation swaps width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Orientation::Rotate90 | Orientation::Rotate270)
    }
}

/// Native dimensions of an encoded image. `(0, 0)` means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    /// The "could not be determined" value.
    pub const UNKNOWN: ImageDimensions = ImageDimensions {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_unknown(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Dimensions as displayed after applying `orientation`.
    pub fn oriented(self, orientation: Orientation) -> Self {
        if orientation.swaps_dimensions() {
            Self::new(self.height, self.width)
        } else {
            self
        }
    }
}

/// Why a decode produced no buffer although no hard error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsentReason {
    /// Every attempt ran out of memory.
    RetriesExhausted {
        attempts: u32,
        last_sample_factor: u32,
    },
}

/// Result of a (possibly retried) decode.
#[derive(Debug)]
pub enum DecodeOutcome {
    Decoded(PixelBuffer),
    OutOfMemory,
    Failed(DecodeError),
    Absent(AbsentReason),
}

impl DecodeOutcome {
    /// Lift a single attempt's result into an outcome, separating memory
    /// exhaustion from every other failure.
    pub fn from_attempt(result: Result<PixelBuffer, DecodeError>) -> Self {
        match result {
            Ok(buffer) => DecodeOutcome::Decoded(buffer),
            Err(DecodeError::OutOfMemory) => DecodeOutcome::OutOfMemory,
            Err(e) => DecodeOutcome::Failed(e),
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, DecodeOutcome::Decoded(_))
    }

    /// Collapse to the public "unavailable" signal.
    pub fn into_buffer(self) -> Option<PixelBuffer> {
        match self {
            DecodeOutcome::Decoded(buffer) => Some(buffer),
            _ => None,
        }
    }
}
