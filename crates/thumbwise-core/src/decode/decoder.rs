//! Sampled decoding of encoded images into RGBA8 buffers.
//!
//! [`Decoder`] is the seam the thumbnail pipeline decodes through.
//! [`StandardDecoder`] implements it so that a larger sample factor really
//! lowers the memory a decode needs:
//!
//! - JPEG is decoded with DCT-domain scaling (1/2, 1/4 or 1/8) through
//!   `jpeg-decoder`, then box-averaged for the remaining factor;
//! - non-interlaced PNG is streamed row by row through `png` and averaged
//!   on the fly, so no full-resolution buffer exists;
//! - anything else (interlaced PNG, CMYK or 16-bit JPEG) is decoded in full
//!   by the `image` crate under [`image::Limits`], then averaged.
//!
//! The allocation limit is checked against what each path actually holds,
//! and exceeding it, or the output budget, is reported as
//! [`DecodeError::OutOfMemory`] instead of aborting.

use image::error::{ImageError, LimitErrorKind};
use image::{ImageFormat, ImageReader, Limits};
use jpeg_decoder::PixelFormat as JpegPixelFormat;
use png::{ColorType as PngColorType, Transformations as PngXform};
use tracing::trace;

use super::sample::{sample_image, sample_raw, BoxSampler, RowLayout};
use super::{DecodeError, HandleReader, ImageHandle};
use crate::buffer::{checked_byte_len, PixelBuffer};
use crate::config::ThumbnailConfig;

/// Decode capability: encoded bytes to pixels at a sample factor.
pub trait Decoder {
    /// Decode `handle` at roughly `1 / sample_factor` linear resolution.
    ///
    /// # Arguments
    ///
    /// * `handle` - Source of the encoded image
    /// * `sample_factor` - Integer divisor for both axes (0 is treated as 1)
    ///
    /// # Returns
    ///
    /// A mutable RGBA8 buffer. Implementations may return a buffer smaller
    /// than `native / sample_factor`; callers must read the actual dimensions.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::OutOfMemory` when the decode does not fit in
    /// memory at this factor; every other error is final.
    fn decode_at(&self, handle: &ImageHandle, sample_factor: u32)
        -> Result<PixelBuffer, DecodeError>;
}

impl<D: Decoder + ?Sized> Decoder for &D {
    fn decode_at(
        &self,
        handle: &ImageHandle,
        sample_factor: u32,
    ) -> Result<PixelBuffer, DecodeError> {
        (**self).decode_at(handle, sample_factor)
    }
}

/// [`Decoder`] backed by `jpeg-decoder`, `png` and the `image` crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardDecoder {
    decode_alloc_limit: Option<u64>,
    output_budget: Option<u64>,
}

impl Default for StandardDecoder {
    fn default() -> Self {
        Self::from_config(&ThumbnailConfig::default())
    }
}

impl StandardDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self {
            decode_alloc_limit: config.decode_alloc_limit,
            output_budget: config.output_budget,
        }
    }

    /// Cap the bytes one decode may hold (`None` = unlimited).
    pub fn with_decode_alloc_limit(mut self, limit: Option<u64>) -> Self {
        self.decode_alloc_limit = limit;
        self
    }

    /// Cap the size of the returned buffer in bytes (`None` = unlimited).
    pub fn with_output_budget(mut self, budget: Option<u64>) -> Self {
        self.output_budget = budget;
        self
    }

    /// Byte length of a `width x height` output, if it fits the budget.
    fn check_output(&self, (width, height): (u32, u32)) -> Result<u64, DecodeError> {
        let len = checked_byte_len(width, height).ok_or(DecodeError::OutOfMemory)? as u64;
        match self.output_budget {
            Some(budget) if len > budget => {
                trace!(bytes = len, budget, "Sampled output exceeds budget");
                Err(DecodeError::OutOfMemory)
            }
            _ => Ok(len),
        }
    }

    fn check_alloc(&self, bytes: u64) -> Result<(), DecodeError> {
        match self.decode_alloc_limit {
            Some(limit) if bytes > limit => {
                trace!(bytes, limit, "Decode exceeds allocation limit");
                Err(DecodeError::OutOfMemory)
            }
            _ => Ok(()),
        }
    }

    fn decode_jpeg(&self, handle: &ImageHandle, factor: u32) -> Result<PixelBuffer, DecodeError> {
        let mut decoder = jpeg_decoder::Decoder::new(open(handle)?);
        decoder.read_info().map_err(map_jpeg_error)?;
        let info = decoder
            .info()
            .ok_or_else(|| DecodeError::CorruptedFile("JPEG header missing".to_string()))?;

        let layout = match info.pixel_format {
            JpegPixelFormat::L8 => RowLayout::Gray,
            JpegPixelFormat::RGB24 => RowLayout::Rgb,
            other => {
                trace!(%handle, pixel_format = ?other, "No scaled decode for JPEG pixel format");
                return self.decode_full(handle, factor);
            }
        };

        let target = sampled_dimensions(u32::from(info.width), u32::from(info.height), factor);
        let (scaled_w, scaled_h) = decoder
            .scale(clamp_u16(target.0), clamp_u16(target.1))
            .map_err(map_jpeg_error)?;
        let scaled = (u32::from(scaled_w), u32::from(scaled_h));

        let output = self.check_output(target)?;
        let decoded = scaled.0 as u64 * scaled.1 as u64 * layout.channels() as u64;
        self.check_alloc(decoded.saturating_add(output))?;

        let pixels = decoder.decode().map_err(map_jpeg_error)?;
        trace!(
            %handle,
            native_width = info.width,
            native_height = info.height,
            scaled_width = scaled.0,
            scaled_height = scaled.1,
            factor,
            "Decoded scaled JPEG"
        );
        sample_raw(layout, scaled, target, &pixels)
    }

    fn decode_png(&self, handle: &ImageHandle, factor: u32) -> Result<PixelBuffer, DecodeError> {
        let limits = png::Limits {
            bytes: self
                .decode_alloc_limit
                .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX)),
        };
        let mut decoder = png::Decoder::new_with_limits(open(handle)?, limits);
        decoder.set_transformations(PngXform::EXPAND | PngXform::STRIP_16);
        let mut reader = decoder.read_info().map_err(map_png_error)?;

        let (width, height, interlaced) = {
            let info = reader.info();
            (info.width, info.height, info.interlaced)
        };
        if interlaced {
            trace!(%handle, "Interlaced PNG cannot be streamed");
            return self.decode_full(handle, factor);
        }

        let layout = match reader.output_color_type().0 {
            PngColorType::Grayscale => RowLayout::Gray,
            PngColorType::GrayscaleAlpha => RowLayout::GrayAlpha,
            PngColorType::Rgb => RowLayout::Rgb,
            PngColorType::Rgba => RowLayout::Rgba,
            other => {
                return Err(DecodeError::CorruptedFile(format!(
                    "Unexpected PNG colour type {other:?}"
                )))
            }
        };

        let target = sampled_dimensions(width, height, factor);
        let output = self.check_output(target)?;
        self.check_alloc(output)?;

        let mut sampler = BoxSampler::new(layout, (width, height), target)?;
        while let Some(row) = reader.next_row().map_err(map_png_error)? {
            sampler.push_row(row.data())?;
        }
        trace!(
            %handle,
            native_width = width,
            native_height = height,
            sampled = ?sampler.dimensions(),
            factor,
            "Streamed PNG"
        );
        sampler.finish()
    }

    fn decode_full(&self, handle: &ImageHandle, factor: u32) -> Result<PixelBuffer, DecodeError> {
        let mut reader = ImageReader::new(open(handle)?)
            .with_guessed_format()
            .map_err(|e| DecodeError::Io(e.to_string()))?;

        let mut limits = Limits::no_limits();
        limits.max_alloc = self.decode_alloc_limit;
        reader.limits(limits);

        let decoded = reader.decode().map_err(map_image_error)?;
        let target = sampled_dimensions(decoded.width(), decoded.height(), factor);
        self.check_output(target)?;
        trace!(
            %handle,
            width = decoded.width(),
            height = decoded.height(),
            factor,
            "Decoded full image"
        );

        sample_image(decoded, target)
    }
}

impl Decoder for StandardDecoder {
    fn decode_at(
        &self,
        handle: &ImageHandle,
        sample_factor: u32,
    ) -> Result<PixelBuffer, DecodeError> {
        let sample_factor = sample_factor.max(1);

        let format = ImageReader::new(open(handle)?)
            .with_guessed_format()
            .map_err(|e| DecodeError::Io(e.to_string()))?
            .format();

        match format {
            Some(ImageFormat::Jpeg) => self.decode_jpeg(handle, sample_factor),
            Some(ImageFormat::Png) => self.decode_png(handle, sample_factor),
            _ => self.decode_full(handle, sample_factor),
        }
    }
}

fn open(handle: &ImageHandle) -> Result<HandleReader<'_>, DecodeError> {
    handle.open().map_err(|e| DecodeError::Io(e.to_string()))
}

fn clamp_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Translate an `image` error into a [`DecodeError`], keeping memory
/// exhaustion distinguishable from every other failure.
pub(crate) fn map_image_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Limits(e) if matches!(e.kind(), LimitErrorKind::InsufficientMemory) => {
            DecodeError::OutOfMemory
        }
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        ImageError::IoError(e) => DecodeError::Io(e.to_string()),
        other => DecodeError::CorruptedFile(other.to_string()),
    }
}

fn map_jpeg_error(err: jpeg_decoder::Error) -> DecodeError {
    match err {
        jpeg_decoder::Error::Unsupported(_) => DecodeError::InvalidFormat,
        jpeg_decoder::Error::Io(e) => DecodeError::Io(e.to_string()),
        other => DecodeError::CorruptedFile(other.to_string()),
    }
}

fn map_png_error(err: png::DecodingError) -> DecodeError {
    match err {
        png::DecodingError::LimitsExceeded => DecodeError::OutOfMemory,
        png::DecodingError::IoError(e) => DecodeError::Io(e.to_string()),
        other => DecodeError::CorruptedFile(other.to_string()),
    }
}

/// Dimensions produced by sampling `width x height` with `factor`.
pub(crate) fn sampled_dimensions(width: u32, height: u32, factor: u32) -> (u32, u32) {
    let factor = factor.max(1);
    ((width / factor).max(1), (height / factor).max(1))
}
