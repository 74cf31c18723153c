//! Tunables for decoding, thumbnailing and freezing.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::decode::FilterType;

/// Default cap on bytes the image codec may allocate for one decode (512 MiB).
pub const DEFAULT_DECODE_ALLOC_LIMIT: u64 = 512 * 1024 * 1024;

/// Configuration shared by the decoder, surface and pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Maximum bytes the codec may allocate while decoding (`None` = no cap).
    /// Exceeding it counts as running out of memory.
    pub decode_alloc_limit: Option<u64>,
    /// Maximum size in bytes of a decoded or transformed buffer
    /// (`None` = no cap). Exceeding it counts as running out of memory.
    pub output_budget: Option<u64>,
    /// Downscale results that still exceed the requested box after decoding.
    pub enforce_bounds: bool,
    /// Filter used when enforcing bounds.
    pub scale_filter: FilterType,
    /// Directory for the temporary files used by `freeze` (`None` = system temp).
    pub temp_dir: Option<PathBuf>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            decode_alloc_limit: Some(DEFAULT_DECODE_ALLOC_LIMIT),
            output_budget: None,
            enforce_bounds: true,
            scale_filter: FilterType::Bilinear,
            temp_dir: None,
        }
    }
}

impl ThumbnailConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
