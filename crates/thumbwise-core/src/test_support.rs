//! In-process fixtures shared by the unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

use crate::buffer::PixelBuffer;
use crate::decode::{DecodeError, Decoder, ImageHandle};

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

/// PNG of a `width x height` RGBA gradient.
pub(crate) fn encode_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// PNG holding exactly the given RGBA8 pixels.
pub(crate) fn encode_png_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Vec<u8> {
    let img = RgbaImage::from_raw(width, height, pixels).unwrap();
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Baseline JPEG of a `width x height` RGB gradient, without EXIF.
pub(crate) fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 8 % 256) as u8, (y * 8 % 256) as u8, 64])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// Insert an APP1 EXIF segment carrying only an orientation tag right
/// after the SOI marker of `jpeg`.
pub(crate) fn with_exif_orientation(jpeg: &[u8], value: u16) -> Vec<u8> {
    // Big-endian TIFF header, IFD0 at offset 8
    let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&value.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes()); // No IFD1

    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend(tiff);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend(payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Decoder that replays a fixed list of results and records the sample
/// factors it was asked for. `Ok(())` decodes to a blank 4x2 buffer.
pub(crate) struct ScriptedDecoder {
    script: RefCell<VecDeque<Result<(), DecodeError>>>,
    fallback: Result<(), DecodeError>,
    factors: RefCell<Vec<u32>>,
}

impl ScriptedDecoder {
    /// Replay `script`, failing with `InvalidFormat` once it runs out.
    pub(crate) fn new(script: Vec<Result<(), DecodeError>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            fallback: Err(DecodeError::InvalidFormat),
            factors: RefCell::default(),
        }
    }

    /// Return `result` on every call.
    pub(crate) fn always(result: Result<(), DecodeError>) -> Self {
        Self {
            script: RefCell::default(),
            fallback: result,
            factors: RefCell::default(),
        }
    }

    pub(crate) fn factors(&self) -> Vec<u32> {
        self.factors.borrow().clone()
    }
}

impl Decoder for ScriptedDecoder {
    fn decode_at(
        &self,
        _handle: &ImageHandle,
        sample_factor: u32,
    ) -> Result<PixelBuffer, DecodeError> {
        self.factors.borrow_mut().push(sample_factor);
        let next = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        next.map(|()| PixelBuffer::new(4, 2).unwrap())
    }
}
