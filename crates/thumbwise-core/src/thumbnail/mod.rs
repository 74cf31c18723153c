//! EXIF-aware thumbnail creation.
//!
//! # Pipeline
//!
//! 1. Read the EXIF orientation
//! 2. Probe the native dimensions from the header
//! 3. Plan the sample factor (dimensions swapped for 90/270 degrees)
//! 4. Decode, retrying with larger factors on out-of-memory
//! 5. Rotate upright (best effort)
//! 6. Downscale into the requested box if still too large (best effort)

mod pipeline;
mod planner;

use thiserror::Error;

pub use pipeline::{create_thumbnail, ThumbnailPipeline};
pub use planner::{plan, DownsamplePlan};

/// Caller errors for thumbnail requests.
///
/// Problems with the image itself never surface here; they make the
/// thumbnail unavailable instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ThumbnailError {
    /// A requested maximum dimension was zero.
    #[error("Thumbnail bounds must be non-zero, got {max_width}x{max_height}")]
    ZeroBound { max_width: u32, max_height: u32 },
}
