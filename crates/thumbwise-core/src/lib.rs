//! Thumbwise Core - memory-aware thumbnails
//!
//! This crate decodes possibly very large images into EXIF-upright
//! thumbnails without exhausting memory, and converts mutable pixel buffers
//! into immutable ones by staging them in a memory-mapped temporary file.
//!
//! ```text
//! ImageHandle ─▶ read_orientation ─▶ probe_dimensions ─▶ plan
//!             ─▶ RetryingDecoder ─▶ ImageSurface::rotate ─▶ PixelBuffer
//! PixelBuffer ─▶ freeze ─▶ immutable PixelBuffer
//! ```

pub mod adjustments;
pub mod buffer;
pub mod config;
pub mod decode;
pub mod freeze;
pub mod surface;
pub mod thumbnail;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use adjustments::{adjust_contrast_brightness, ContrastBrightness};
pub use buffer::{BufferError, PixelBuffer};
pub use config::ThumbnailConfig;
pub use decode::{
    DecodeError, DecodeOutcome, Decoder, ImageDimensions, ImageHandle, Orientation,
    RetryingDecoder, StandardDecoder,
};
pub use freeze::{freeze, freeze_in, freeze_with_config, TransferError};
pub use surface::{CpuSurface, ImageSurface};
pub use thumbnail::{create_thumbnail, ThumbnailError, ThumbnailPipeline};
pub use transform::TransformError;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encode_jpeg, with_exif_orientation};

    #[test]
    fn test_thumbnail_then_freeze() {
        let dir = tempfile::tempdir().unwrap();
        let handle = ImageHandle::from_bytes(with_exif_orientation(&encode_jpeg(80, 40), 6));

        let thumb = create_thumbnail(&handle, 20, 40).unwrap().unwrap();
        assert_eq!(thumb.dimensions(), (20, 40));

        let expected = thumb.clone();
        let frozen = freeze_in(thumb, dir.path()).unwrap();
        assert_eq!(frozen, expected);
        assert!(!frozen.is_mutable());
    }

    #[test]
    fn test_frozen_thumbnail_can_still_be_adjusted() {
        let frozen = freeze(PixelBuffer::new(3, 3).unwrap()).unwrap();
        let brighter = adjust_contrast_brightness(&frozen, ContrastBrightness::new(1.0, 10.0)).unwrap();

        assert!(brighter.is_mutable());
        assert_eq!(brighter.pixel(1, 1), Some([10, 10, 10, 0]));
    }
}
