//! Orchestration of probe, plan, decode and rotate.

use tracing::debug;

use super::{plan, ThumbnailError};
use crate::buffer::PixelBuffer;
use crate::config::ThumbnailConfig;
use crate::decode::{
    probe_dimensions, read_orientation, DecodeOutcome, Decoder, ImageHandle, Orientation,
    RetryingDecoder, StandardDecoder,
};
use crate::surface::{CpuSurface, ImageSurface};

/// Creates upright thumbnails that fit a requested box.
///
/// The pipeline holds no per-call state; one instance can serve any number
/// of handles, and concurrent calls each get their own buffers.
#[derive(Debug, Clone)]
pub struct ThumbnailPipeline<D = StandardDecoder, S = CpuSurface> {
    decoder: RetryingDecoder<D>,
    surface: S,
    enforce_bounds: bool,
}

impl Default for ThumbnailPipeline {
    fn default() -> Self {
        Self::from_config(&ThumbnailConfig::default())
    }
}

impl ThumbnailPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self {
            decoder: RetryingDecoder::new(StandardDecoder::from_config(config)),
            surface: CpuSurface::from_config(config),
            enforce_bounds: config.enforce_bounds,
        }
    }
}

impl<D: Decoder, S: ImageSurface> ThumbnailPipeline<D, S> {
    /// Build a pipeline around custom decode and surface capabilities.
    pub fn with_parts(decoder: D, surface: S) -> Self {
        Self {
            decoder: RetryingDecoder::new(decoder),
            surface,
            enforce_bounds: ThumbnailConfig::default().enforce_bounds,
        }
    }

    /// Downscale results that still exceed the box after decoding.
    pub fn with_enforce_bounds(mut self, enforce: bool) -> Self {
        self.enforce_bounds = enforce;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Create a thumbnail of `handle` no larger than `max_width x max_height`.
    ///
    /// The EXIF orientation is honoured: the sample factor is computed on the
    /// upright dimensions and the decoded pixels are rotated upright.
    ///
    /// A failed rotation or downscale does not forfeit the decode; the
    /// unrotated or unscaled buffer is returned.
    ///
    /// # Arguments
    ///
    /// * `handle` - The image to thumbnail
    /// * `max_width` - Maximum width of the upright thumbnail
    /// * `max_height` - Maximum height of the upright thumbnail
    ///
    /// # Returns
    ///
    /// `Some` mutable RGBA8 buffer, or `None` when the image cannot be
    /// decoded, including when every retry ran out of memory.
    ///
    /// # Errors
    ///
    /// Returns `ThumbnailError::ZeroBound` if either maximum is zero.
    pub fn create_thumbnail(
        &self,
        handle: &ImageHandle,
        max_width: u32,
        max_height: u32,
    ) -> Result<Option<PixelBuffer>, ThumbnailError> {
        debug!(%handle, max_width, max_height, "Creating thumbnail");

        let orientation = read_orientation(handle);
        let native = probe_dimensions(handle);
        let plan = plan(native, orientation, max_width, max_height)?;
        debug!(
            %handle,
            native_width = native.width,
            native_height = native.height,
            sample_factor = plan.sample_factor,
            rotation = plan.rotation.degrees(),
            "Planned thumbnail decode"
        );

        let decoded = match self.decoder.decode(handle, plan.sample_factor) {
            DecodeOutcome::Decoded(buffer) => buffer,
            outcome => {
                debug!(%handle, ?outcome, "Could not decode image, thumbnail unavailable");
                return Ok(None);
            }
        };

        let thumbnail = self.rotate(decoded, plan.rotation);
        let thumbnail = if self.enforce_bounds {
            self.fit(thumbnail, max_width, max_height)
        } else {
            thumbnail
        };

        debug!(
            %handle,
            width = thumbnail.width(),
            height = thumbnail.height(),
            "Created thumbnail"
        );
        Ok(Some(thumbnail))
    }

    /// Rotate upright, keeping the original orientation if the surface fails.
    fn rotate(&self, decoded: PixelBuffer, rotation: Orientation) -> PixelBuffer {
        if rotation == Orientation::Normal {
            return decoded;
        }

        match self.surface.rotate(&decoded, rotation) {
            Ok(rotated) => {
                self.surface.recycle(decoded);
                rotated
            }
            Err(e) => {
                debug!(
                    error = %e,
                    degrees = rotation.degrees(),
                    "Could not rotate thumbnail, keeping original orientation"
                );
                decoded
            }
        }
    }

    /// Downscale into the box, keeping the buffer as is if the surface fails.
    fn fit(&self, buffer: PixelBuffer, max_width: u32, max_height: u32) -> PixelBuffer {
        if buffer.width() <= max_width && buffer.height() <= max_height {
            return buffer;
        }

        match self.surface.scale_to_fit(&buffer, max_width, max_height) {
            Ok(scaled) => {
                self.surface.recycle(buffer);
                scaled
            }
            Err(e) => {
                debug!(
                    error = %e,
                    width = buffer.width(),
                    height = buffer.height(),
                    "Could not scale thumbnail into bounds, keeping decoded size"
                );
                buffer
            }
        }
    }
}

/// Create a thumbnail with the default decoder, surface and configuration.
///
/// # Arguments
///
/// * `handle` - The image to thumbnail
/// * `max_width` - Maximum width of the upright thumbnail
/// * `max_height` - Maximum height of the upright thumbnail
///
/// # Returns
///
/// See [`ThumbnailPipeline::create_thumbnail`].
///
/// # Errors
///
/// Returns `ThumbnailError::ZeroBound` if either maximum is zero.
pub fn create_thumbnail(
    handle: &ImageHandle,
    max_width: u32,
    max_height: u32,
) -> Result<Option<PixelBuffer>, ThumbnailError> {
    ThumbnailPipeline::new().create_thumbnail(handle, max_width, max_height)
}
