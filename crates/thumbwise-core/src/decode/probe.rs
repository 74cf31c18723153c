//! Header-only dimension probing.

use image::ImageReader;
use tracing::debug;

use super::decoder::map_image_error;
use super::{DecodeError, ImageDimensions, ImageHandle};

/// Read the native dimensions of an encoded image without decoding pixels.
///
/// Only the format header is parsed. Any failure (missing file, unknown
/// format, truncated header) yields [`ImageDimensions::UNKNOWN`].
pub fn probe_dimensions(handle: &ImageHandle) -> ImageDimensions {
    match read_dimensions(handle) {
        Ok(dims) => {
            debug!(%handle, width = dims.width, height = dims.height, "Probed image bounds");
            dims
        }
        Err(e) => {
            debug!(%handle, error = %e, "Could not read image bounds, treating as unknown");
            ImageDimensions::UNKNOWN
        }
    }
}

fn read_dimensions(handle: &ImageHandle) -> Result<ImageDimensions, DecodeError> {
    let reader = handle.open().map_err(|e| DecodeError::Io(e.to_string()))?;
    let (width, height) = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| DecodeError::Io(e.to_string()))?
        .into_dimensions()
        .map_err(map_image_error)?;
    Ok(ImageDimensions::new(width, height))
}
