//! Platform image surface: rotate, scale and release pixel buffers.
//!
//! The thumbnail pipeline only manipulates decoded pixels through
//! [`ImageSurface`], so hosts with their own imaging backend can plug it in.
//! [`CpuSurface`] is the in-process implementation built on [`crate::transform`].

use tracing::trace;

use crate::buffer::{byte_len, PixelBuffer};
use crate::config::ThumbnailConfig;
use crate::decode::{FilterType, Orientation};
use crate::transform::{self, fit_dimensions, TransformError};

/// Image surface capability.
pub trait ImageSurface {
    /// Rotate `buffer` clockwise. The source is left intact; the caller
    /// decides when to recycle it.
    fn rotate(
        &self,
        buffer: &PixelBuffer,
        rotation: Orientation,
    ) -> Result<PixelBuffer, TransformError>;

    /// Downscale `buffer` to fit within `max_width x max_height`.
    fn scale_to_fit(
        &self,
        buffer: &PixelBuffer,
        max_width: u32,
        max_height: u32,
    ) -> Result<PixelBuffer, TransformError>;

    /// Release a buffer that is no longer needed.
    fn recycle(&self, buffer: PixelBuffer) {
        trace!(
            width = buffer.width(),
            height = buffer.height(),
            bytes = buffer.byte_size(),
            "Recycling pixel buffer"
        );
        drop(buffer);
    }
}

impl<S: ImageSurface + ?Sized> ImageSurface for &S {
    fn rotate(
        &self,
        buffer: &PixelBuffer,
        rotation: Orientation,
    ) -> Result<PixelBuffer, TransformError> {
        (**self).rotate(buffer, rotation)
    }

    fn scale_to_fit(
        &self,
        buffer: &PixelBuffer,
        max_width: u32,
        max_height: u32,
    ) -> Result<PixelBuffer, TransformError> {
        (**self).scale_to_fit(buffer, max_width, max_height)
    }

    fn recycle(&self, buffer: PixelBuffer) {
        (**self).recycle(buffer)
    }
}

/// [`ImageSurface`] running on the CPU with an optional allocation cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuSurface {
    filter: FilterType,
    alloc_limit: Option<u64>,
}

impl Default for CpuSurface {
    fn default() -> Self {
        Self::from_config(&ThumbnailConfig::default())
    }
}

impl CpuSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self {
            filter: config.scale_filter,
            alloc_limit: config.output_budget,
        }
    }

    /// Resampling filter used by `scale_to_fit`.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Refuse to allocate output buffers larger than `limit` bytes.
    pub fn with_alloc_limit(mut self, limit: Option<u64>) -> Self {
        self.alloc_limit = limit;
        self
    }

    fn check_alloc(&self, width: u32, height: u32) -> Result<(), TransformError> {
        let bytes = byte_len(width, height);
        match self.alloc_limit {
            Some(limit) if bytes as u64 > limit => Err(TransformError::OutOfMemory { bytes }),
            _ => Ok(()),
        }
    }
}

impl ImageSurface for CpuSurface {
    fn rotate(
        &self,
        buffer: &PixelBuffer,
        rotation: Orientation,
    ) -> Result<PixelBuffer, TransformError> {
        self.check_alloc(buffer.width(), buffer.height())?;
        transform::rotate_right_angle(buffer, rotation)
    }

    fn scale_to_fit(
        &self,
        buffer: &PixelBuffer,
        max_width: u32,
        max_height: u32,
    ) -> Result<PixelBuffer, TransformError> {
        let (width, height) = fit_dimensions(buffer.width(), buffer.height(), max_width, max_height)?;
        self.check_alloc(width, height)?;
        transform::scale_to_fit(buffer, max_width, max_height, self.filter)
    }
}
