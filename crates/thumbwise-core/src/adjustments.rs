//! Contrast and brightness colour filter.
//!
//! Applies the colour matrix
//! ```text
//! | c 0 0 0 b |
//! | 0 c 0 0 b |
//! | 0 0 c 0 b |
//! | 0 0 0 1 0 |
//! ```
//! to RGBA pixel data: each colour channel becomes `c * v + b`, clamped to
//! 0..=255, and alpha is left untouched.

use serde::{Deserialize, Serialize};

use crate::buffer::{BufferError, PixelBuffer, BYTES_PER_PIXEL};
use crate::transform::{try_alloc, TransformError};

/// Contrast multiplier range (1.0 = unchanged).
pub const CONTRAST_RANGE: (f32, f32) = (0.0, 10.0);

/// Brightness offset range (0.0 = unchanged).
pub const BRIGHTNESS_RANGE: (f32, f32) = (-255.0, 255.0);

/// Contrast/brightness parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrastBrightness {
    /// Contrast multiplier (0 to 10)
    pub contrast: f32,
    /// Brightness offset (-255 to 255)
    pub brightness: f32,
}

impl Default for ContrastBrightness {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            brightness: 0.0,
        }
    }
}

impl ContrastBrightness {
    pub fn new(contrast: f32, brightness: f32) -> Self {
        Self {
            contrast,
            brightness,
        }
    }

    /// Check if the filter leaves pixels unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Parameters clamped into their documented ranges.
    fn clamped(self) -> Self {
        Self {
            contrast: self.contrast.clamp(CONTRAST_RANGE.0, CONTRAST_RANGE.1),
            brightness: self.brightness.clamp(BRIGHTNESS_RANGE.0, BRIGHTNESS_RANGE.1),
        }
    }
}

/// Apply the filter to RGBA pixel data in place.
pub fn apply_contrast_brightness(pixels: &mut [u8], params: ContrastBrightness) {
    // Early exit if no adjustment
    if params.is_identity() {
        return;
    }

    let lut = build_lut(params.clamped());
    for chunk in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
        chunk[0] = lut[chunk[0] as usize];
        chunk[1] = lut[chunk[1] as usize];
        chunk[2] = lut[chunk[2] as usize];
    }
}

/// Return a filtered copy of `image` (mutable or frozen).
///
/// # Errors
///
/// Returns `TransformError::OutOfMemory` if the output cannot be allocated.
pub fn adjust_contrast_brightness(
    image: &PixelBuffer,
    params: ContrastBrightness,
) -> Result<PixelBuffer, TransformError> {
    let mut output = try_alloc(image.byte_size())?;
    output.extend_from_slice(image.pixels());
    apply_contrast_brightness(&mut output, params);
    Ok(PixelBuffer::from_rgba(image.width(), image.height(), output)?)
}

/// Filter a mutable buffer in place.
///
/// # Errors
///
/// Returns `BufferError::Immutable` for frozen buffers.
pub fn adjust_contrast_brightness_in_place(
    image: &mut PixelBuffer,
    params: ContrastBrightness,
) -> Result<(), BufferError> {
    apply_contrast_brightness(image.pixels_mut()?, params);
    Ok(())
}

/// Precompute `c * v + b` for every 8-bit input.
fn build_lut(params: ContrastBrightness) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        let value = params.contrast * v as f32 + params.brightness;
        *out = value.clamp(0.0, 255.0).round() as u8;
    }
    lut
}
