//! Pixel transforms used by the thumbnail pipeline.
//!
//! Every transform reads a borrowed [`PixelBuffer`] (mutable or frozen) and
//! returns a new mutable buffer. Output memory is reserved fallibly, so a
//! transform under memory pressure fails with [`TransformError::OutOfMemory`]
//! instead of aborting the process.
//!
//! # Coordinate System
//!
//! - Rotations are clockwise multiples of 90 degrees
//! - Origin is the top-left corner

mod rotation;
mod scale;

use thiserror::Error;

use crate::buffer::BufferError;

pub use rotation::{flip_horizontal, rotate_right_angle};
pub use scale::{fit_dimensions, scale_to_fit};

/// Errors raised by pixel transforms.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The output buffer could not be allocated.
    #[error("Out of memory allocating {bytes} bytes")]
    OutOfMemory { bytes: usize },

    /// A requested bound was zero.
    #[error("Invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Reserve an empty output vector able to hold `len` bytes.
pub(crate) fn try_alloc(len: usize) -> Result<Vec<u8>, TransformError> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| TransformError::OutOfMemory { bytes: len })?;
    Ok(out)
}
