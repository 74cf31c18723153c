//! Lossless right-angle rotation and mirroring.
//!
//! The rotation uses inverse mapping: for each pixel in the output image we
//! look up the single source pixel that lands there, so no interpolation is
//! needed.
//!
//! For a `w x h` source rotated clockwise:
//! ```text
//!  90: dst(x, y) = src(y, h - 1 - x)      output is h x w
//! 180: dst(x, y) = src(w - 1 - x, h - 1 - y)
//! 270: dst(x, y) = src(w - 1 - y, x)      output is h x w
//! ```

use super::{try_alloc, TransformError};
use crate::buffer::{byte_len, PixelBuffer, BYTES_PER_PIXEL};
use crate::decode::Orientation;

/// Rotate an image clockwise by the angle of `orientation`.
///
/// `Orientation::Normal` returns a mutable copy.
///
/// # Errors
///
/// Returns `TransformError::OutOfMemory` if the output buffer cannot be
/// allocated.
pub fn rotate_right_angle(
    image: &PixelBuffer,
    orientation: Orientation,
) -> Result<PixelBuffer, TransformError> {
    let (w, h) = image.dimensions();
    let (dst_w, dst_h) = if orientation.swaps_dimensions() {
        (h, w)
    } else {
        (w, h)
    };

    remap(image, dst_w, dst_h, |x, y| match orientation {
        Orientation::Normal => (x, y),
        Orientation::Rotate90 => (y, h - 1 - x),
        Orientation::Rotate180 => (w - 1 - x, h - 1 - y),
        Orientation::Rotate270 => (w - 1 - y, x),
    })
}

/// Mirror an image left to right.
///
/// # Errors
///
/// Returns `TransformError::OutOfMemory` if the output buffer cannot be
/// allocated.
pub fn flip_horizontal(image: &PixelBuffer) -> Result<PixelBuffer, TransformError> {
    let (w, h) = image.dimensions();
    remap(image, w, h, |x, y| (w - 1 - x, y))
}

/// Build a `dst_w x dst_h` image where each pixel is copied from the source
/// coordinate returned by `source_of`.
fn remap(
    image: &PixelBuffer,
    dst_w: u32,
    dst_h: u32,
    source_of: impl Fn(u32, u32) -> (u32, u32),
) -> Result<PixelBuffer, TransformError> {
    let len = byte_len(dst_w, dst_h);
    let mut output = try_alloc(len)?;

    let src = image.pixels();
    let src_w = image.width() as usize;
    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            let (src_x, src_y) = source_of(dst_x, dst_y);
            let idx = (src_y as usize * src_w + src_x as usize) * BYTES_PER_PIXEL;
            output.extend_from_slice(&src[idx..idx + BYTES_PER_PIXEL]);
        }
    }

    Ok(PixelBuffer::from_rgba(dst_w, dst_h, output)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const YELLOW: [u8; 4] = [255, 255, 0, 255];

    /// 2x2 image:
    /// ```text
    /// R G
    /// B Y
    /// ```
    fn quad() -> PixelBuffer {
        PixelBuffer::from_rgba(2, 2, [RED, GREEN, BLUE, YELLOW].concat()).unwrap()
    }

    /// 2x1 image: R G
    fn strip() -> PixelBuffer {
        PixelBuffer::from_rgba(2, 1, [RED, GREEN].concat()).unwrap()
    }

    #[test]
    fn test_normal_is_copy() {
        let img = quad();
        let result = rotate_right_angle(&img, Orientation::Normal).unwrap();
        assert_eq!(result, img);
        assert!(result.is_mutable());
    }

    #[test]
    fn test_rotate90_swaps_dimensions() {
        let result = rotate_right_angle(&strip(), Orientation::Rotate90).unwrap();

        // Left pixel ends up on top
        assert_eq!(result.dimensions(), (1, 2));
        assert_eq!(result.pixel(0, 0), Some(RED));
        assert_eq!(result.pixel(0, 1), Some(GREEN));
    }

    #[test]
    fn test_rotate270_swaps_dimensions() {
        let result = rotate_right_angle(&strip(), Orientation::Rotate270).unwrap();

        // Right pixel ends up on top
        assert_eq!(result.dimensions(), (1, 2));
        assert_eq!(result.pixel(0, 0), Some(GREEN));
        assert_eq!(result.pixel(0, 1), Some(RED));
    }

    #[test]
    fn test_rotate90_quad() {
        let result = rotate_right_angle(&quad(), Orientation::Rotate90).unwrap();

        // B R
        // Y G
        assert_eq!(result.pixel(0, 0), Some(BLUE));
        assert_eq!(result.pixel(1, 0), Some(RED));
        assert_eq!(result.pixel(0, 1), Some(YELLOW));
        assert_eq!(result.pixel(1, 1), Some(GREEN));
    }

    #[test]
    fn test_rotate180_quad() {
        let result = rotate_right_angle(&quad(), Orientation::Rotate180).unwrap();

        assert_eq!(result.pixel(0, 0), Some(YELLOW));
        assert_eq!(result.pixel(1, 0), Some(BLUE));
        assert_eq!(result.pixel(0, 1), Some(GREEN));
        assert_eq!(result.pixel(1, 1), Some(RED));
    }

    #[test]
    fn test_four_quarter_turns_are_identity() {
        let img = PixelBuffer::from_rgba(3, 2, (0..24).collect()).unwrap();
        let mut result = img.clone();
        for _ in 0..4 {
            result = rotate_right_angle(&result, Orientation::Rotate90).unwrap();
        }
        assert_eq!(result, img);
    }

    #[test]
    fn test_rotate90_then_rotate270_is_identity() {
        let img = PixelBuffer::from_rgba(3, 2, (0..24).collect()).unwrap();
        let there = rotate_right_angle(&img, Orientation::Rotate90).unwrap();
        let back = rotate_right_angle(&there, Orientation::Rotate270).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_flip_horizontal() {
        let result = flip_horizontal(&strip()).unwrap();

        assert_eq!(result.pixel(0, 0), Some(GREEN));
        assert_eq!(result.pixel(1, 0), Some(RED));
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let img = quad();
        let twice = flip_horizontal(&flip_horizontal(&img).unwrap()).unwrap();
        assert_eq!(twice, img);
    }

    #[test]
    fn test_empty_image() {
        let img = PixelBuffer::new(0, 0).unwrap();
        let result = rotate_right_angle(&img, Orientation::Rotate90).unwrap();
        assert!(result.is_empty());
    }
}
