//! Aspect-preserving downscaling into a bounding box.
//!
//! Uses the `image` crate's resampling filters. Images that already fit are
//! returned unchanged; nothing is ever upscaled.

use super::TransformError;
use crate::buffer::PixelBuffer;
use crate::decode::FilterType;

/// Downscale an image so that it fits inside `max_width x max_height`.
///
/// The aspect ratio is preserved and the result touches the box on its
/// limiting axis. If the image already fits, a copy is returned.
///
/// # Errors
///
/// Returns `TransformError::InvalidDimensions` if either bound is zero.
pub fn scale_to_fit(
    image: &PixelBuffer,
    max_width: u32,
    max_height: u32,
    filter: FilterType,
) -> Result<PixelBuffer, TransformError> {
    let (width, height) = fit_dimensions(image.width(), image.height(), max_width, max_height)?;

    // Fast path: already fits
    if (width, height) == image.dimensions() {
        return Ok(image.clone());
    }

    let view = image
        .as_image_view()
        .ok_or(TransformError::InvalidDimensions {
            width: image.width(),
            height: image.height(),
        })?;
    let resized = image::imageops::resize(&view, width, height, filter.to_image_filter());

    Ok(PixelBuffer::from_rgba_image(resized))
}

/// Calculate the dimensions of `width x height` scaled down to fit within
/// `max_width x max_height` while preserving aspect ratio.
///
/// Integer arithmetic keeps the result inside the box exactly; each side is
/// at least 1 pixel. Zero-area inputs are returned unchanged.
///
/// # Errors
///
/// Returns `TransformError::InvalidDimensions` if either bound is zero.
pub fn fit_dimensions(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
) -> Result<(u32, u32), TransformError> {
    if max_width == 0 || max_height == 0 {
        return Err(TransformError::InvalidDimensions {
            width: max_width,
            height: max_height,
        });
    }

    if width == 0 || height == 0 || (width <= max_width && height <= max_height) {
        return Ok((width, height));
    }

    let (w, h) = (width as u64, height as u64);
    let (max_w, max_h) = (max_width as u64, max_height as u64);

    // Compare w/max_w with h/max_h without division
    if w * max_h >= h * max_w {
        // Width is the limiting axis
        let new_h = (h * max_w / w).max(1);
        Ok((max_width, new_h as u32))
    } else {
        // Height is the limiting axis
        let new_w = (w * max_h / h).max(1);
        Ok((new_w as u32, max_height))
    }
}
