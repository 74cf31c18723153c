//! Owned RGBA8 pixel buffers with explicit mutability.
//!
//! A [`PixelBuffer`] starts out mutable and owns a `Vec<u8>`. Once frozen
//! (see [`crate::freeze`]) its pixels live behind an `Arc<[u8]>`: clones share
//! the same bytes and in-place writes are refused.

use std::sync::Arc;

use thiserror::Error;

/// Bytes per pixel of every buffer in this crate (RGBA8).
pub const BYTES_PER_PIXEL: usize = 4;

/// Errors raised when building or writing to a [`PixelBuffer`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// The buffer is frozen and cannot be written to.
    #[error("Pixel buffer is immutable")]
    Immutable,

    /// The byte length does not match `width * height * 4`.
    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The pixel data for these dimensions cannot be allocated.
    #[error("Pixel buffer of {width}x{height} cannot be allocated")]
    TooLarge { width: u32, height: u32 },
}

#[derive(Debug, Clone)]
enum Pixels {
    Mutable(Vec<u8>),
    Frozen(Arc<[u8]>),
}

/// A rectangular grid of RGBA8 pixels in row-major order.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Pixels,
}

impl PixelBuffer {
    /// Create a mutable buffer from raw RGBA8 bytes.
    ///
    /// # Errors
    ///
    /// Returns `BufferError::SizeMismatch` if `pixels.len()` is not
    /// `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, BufferError> {
        check_len(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels: Pixels::Mutable(pixels),
        })
    }

    /// Create a mutable, zero-filled (transparent black) buffer.
    ///
    /// # Errors
    ///
    /// Returns `BufferError::TooLarge` if the byte length overflows `usize`
    /// or the allocation fails.
    pub fn new(width: u32, height: u32) -> Result<Self, BufferError> {
        let too_large = BufferError::TooLarge { width, height };
        let len = checked_byte_len(width, height).ok_or(too_large.clone())?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len).map_err(|_| too_large)?;
        pixels.resize(len, 0);

        Ok(Self {
            width,
            height,
            pixels: Pixels::Mutable(pixels),
        })
    }

    /// Create a mutable buffer from an `image::RgbaImage`.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: Pixels::Mutable(img.into_raw()),
        }
    }

    pub(crate) fn frozen(width: u32, height: u32, pixels: Arc<[u8]>) -> Result<Self, BufferError> {
        check_len(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels: Pixels::Frozen(pixels),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` of the buffer.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        match &self.pixels {
            Pixels::Mutable(v) => v,
            Pixels::Frozen(a) => a,
        }
    }

    /// Writable access to the pixels.
    ///
    /// # Errors
    ///
    /// Returns `BufferError::Immutable` for frozen buffers.
    pub fn pixels_mut(&mut self) -> Result<&mut [u8], BufferError> {
        match &mut self.pixels {
            Pixels::Mutable(v) => Ok(v),
            Pixels::Frozen(_) => Err(BufferError::Immutable),
        }
    }

    pub fn is_mutable(&self) -> bool {
        matches!(self.pixels, Pixels::Mutable(_))
    }

    /// Get the RGBA value at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.pixels()[idx..idx + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Size of the pixel data in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels().len()
    }

    /// Check if this is a zero-area buffer.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Convert into an `image::RgbaImage`, copying only when frozen.
    pub fn into_rgba_image(self) -> Option<image::RgbaImage> {
        let raw = match self.pixels {
            Pixels::Mutable(v) => v,
            Pixels::Frozen(a) => a.to_vec(),
        };
        image::RgbaImage::from_raw(self.width, self.height, raw)
    }

    /// Borrow the pixels as an image view without copying.
    pub(crate) fn as_image_view(&self) -> Option<image::ImageBuffer<image::Rgba<u8>, &[u8]>> {
        image::ImageBuffer::from_raw(self.width, self.height, self.pixels())
    }
}

impl PartialEq for PixelBuffer {
    /// Buffers compare by dimensions and pixel content; mutability is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.pixels() == other.pixels()
    }
}

impl Eq for PixelBuffer {}

/// Byte length of an RGBA8 buffer, saturating on overflow.
pub(crate) fn byte_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(BYTES_PER_PIXEL)
}

/// Byte length of an RGBA8 buffer, or `None` on overflow.
pub(crate) fn checked_byte_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(BYTES_PER_PIXEL)
}

fn check_len(width: u32, height: u32, actual: usize) -> Result<(), BufferError> {
    let expected = byte_len(width, height);
    if expected != actual {
        return Err(BufferError::SizeMismatch { expected, actual });
    }
    Ok(())
}
