//! Sample factor selection for thumbnails.

use super::ThumbnailError;
use crate::decode::{ImageDimensions, Orientation};

/// How to decode an image for a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownsamplePlan {
    /// Integer decode divisor, always at least 1.
    pub sample_factor: u32,
    /// Clockwise rotation to apply after decoding.
    pub rotation: Orientation,
}

/// Choose the sample factor for decoding `native` into a
/// `max_width x max_height` thumbnail.
///
/// For 90/270 degree orientations the native dimensions are swapped first,
/// since the decoded pixels are rotated afterwards. The factor is the larger
/// of the two integer ratios, never below 1; images already smaller than the
/// box (and unknown `(0, 0)` dimensions) decode at full resolution.
///
/// # Arguments
///
/// * `native` - Dimensions as stored in the file
/// * `orientation` - EXIF orientation of the image
/// * `max_width` - Maximum width of the upright thumbnail
/// * `max_height` - Maximum height of the upright thumbnail
///
/// # Returns
///
/// The sample factor and the rotation to apply after decoding.
///
/// # Errors
///
/// Returns `ThumbnailError::ZeroBound` if either maximum is zero.
pub fn plan(
    native: ImageDimensions,
    orientation: Orientation,
    max_width: u32,
    max_height: u32,
) -> Result<DownsamplePlan, ThumbnailError> {
    if max_width == 0 || max_height == 0 {
        return Err(ThumbnailError::ZeroBound {
            max_width,
            max_height,
        });
    }

    let effective = native.oriented(orientation);
    let width_ratio = effective.width / max_width;
    let height_ratio = effective.height / max_height;

    Ok(DownsamplePlan {
        sample_factor: width_ratio.max(height_ratio).max(1),
        rotation: orientation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dims(width: u32, height: u32) -> ImageDimensions {
        ImageDimensions::new(width, height)
    }

    #[test]
    fn test_landscape_normal() {
        let plan = plan(dims(4000, 3000), Orientation::Normal, 800, 600).unwrap();
        assert_eq!(plan.sample_factor, 5);
        assert_eq!(plan.rotation, Orientation::Normal);
    }

    #[test]
    fn test_portrait_rotate90_swaps() {
        let plan = plan(dims(3000, 4000), Orientation::Rotate90, 800, 600).unwrap();
        assert_eq!(plan.sample_factor, 5);
        assert_eq!(plan.rotation, Orientation::Rotate90);
    }

    #[test]
    fn test_swap_changes_factor() {
        // Without the swap this would be max(3000/800, 4000/300) = 13
        let normal = plan(dims(3000, 4000), Orientation::Normal, 800, 300).unwrap();
        let rotated = plan(dims(3000, 4000), Orientation::Rotate270, 800, 300).unwrap();

        assert_eq!(normal.sample_factor, 13);
        assert_eq!(rotated.sample_factor, 10); // max(4000/800, 3000/300)
    }

    #[test]
    fn test_smaller_than_box_is_full_resolution() {
        let plan = plan(dims(500, 500), Orientation::Normal, 800, 800).unwrap();
        assert_eq!(plan.sample_factor, 1);
    }

    #[test]
    fn test_one_axis_over() {
        let plan = plan(dims(2500, 100), Orientation::Normal, 800, 800).unwrap();
        assert_eq!(plan.sample_factor, 3);
    }

    #[test]
    fn test_unknown_dimensions() {
        let plan = plan(ImageDimensions::UNKNOWN, Orientation::Rotate180, 800, 600).unwrap();
        assert_eq!(plan.sample_factor, 1);
        assert_eq!(plan.rotation, Orientation::Rotate180);
    }

    #[test]
    fn test_zero_bounds_rejected() {
        assert_eq!(
            plan(dims(100, 100), Orientation::Normal, 0, 100),
            Err(ThumbnailError::ZeroBound {
                max_width: 0,
                max_height: 100
            })
        );
        assert!(plan(dims(100, 100), Orientation::Normal, 100, 0).is_err());
    }

    fn orientation_strategy() -> impl Strategy<Value = Orientation> {
        prop_oneof![
            Just(Orientation::Normal),
            Just(Orientation::Rotate90),
            Just(Orientation::Rotate180),
            Just(Orientation::Rotate270),
        ]
    }

    proptest! {
        #[test]
        fn prop_unswapped_factor(
            w in 0u32..100_000,
            h in 0u32..100_000,
            max_w in 1u32..5_000,
            max_h in 1u32..5_000,
            rotate in any::<bool>(),
        ) {
            let orientation = if rotate { Orientation::Rotate180 } else { Orientation::Normal };
            let plan = plan(dims(w, h), orientation, max_w, max_h).unwrap();
            prop_assert_eq!(plan.sample_factor, (w / max_w).max(h / max_h).max(1));
        }

        #[test]
        fn prop_swapped_factor(
            w in 0u32..100_000,
            h in 0u32..100_000,
            max_w in 1u32..5_000,
            max_h in 1u32..5_000,
            clockwise in any::<bool>(),
        ) {
            let orientation = if clockwise { Orientation::Rotate90 } else { Orientation::Rotate270 };
            let plan = plan(dims(w, h), orientation, max_w, max_h).unwrap();
            prop_assert_eq!(plan.sample_factor, (h / max_w).max(w / max_h).max(1));
        }

        #[test]
        fn prop_factor_at_least_one(
            w in 0u32..100_000,
            h in 0u32..100_000,
            max_w in 1u32..100_000,
            max_h in 1u32..100_000,
            orientation in orientation_strategy(),
        ) {
            let plan = plan(dims(w, h), orientation, max_w, max_h).unwrap();
            prop_assert!(plan.sample_factor >= 1);
            prop_assert_eq!(plan.rotation, orientation);
        }
    }
}
