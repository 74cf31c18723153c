//! Image decoding for thumbwise.
//!
//! This module provides functionality for:
//! - Probing native dimensions from the image header alone
//! - Reading the EXIF orientation
//! - Decoding at an integer sample factor
//! - Retrying decodes that ran out of memory with a larger sample factor
//!
//! # Memory Strategy
//!
//! Decoding is the only step with a defined mitigation for memory
//! exhaustion: a larger sample factor shrinks the decode itself. JPEG is
//! decoded with DCT scaling and PNG is streamed row by row into a box filter,
//! so the full-resolution image is never held for either. Out-of-memory
//! is therefore carried as data ([`DecodeOutcome::OutOfMemory`]) rather than
//! as a panic, and [`RetryingDecoder`] escalates the factor a bounded number
//! of times.
//!
//! # Examples
//!
//! ```ignore
//! use thumbwise_core::decode::{ImageHandle, RetryingDecoder, StandardDecoder};
//!
//! let handle = ImageHandle::from_path("photo.jpg");
//! let outcome = RetryingDecoder::new(StandardDecoder::new()).decode(&handle, 2);
//! if let Some(buffer) = outcome.into_buffer() {
//!     println!("Decoded {}x{} image", buffer.width(), buffer.height());
//! }
//! ```

mod decoder;
mod handle;
mod orientation;
mod probe;
mod retry;
mod sample;
mod types;

pub use decoder::{Decoder, StandardDecoder};
pub use handle::{HandleReader, ImageHandle};
pub use orientation::read_orientation;
pub use probe::probe_dimensions;
pub use retry::{RetryingDecoder, MAX_DECODE_ATTEMPTS};
pub use types::{AbsentReason, DecodeError, DecodeOutcome, FilterType, ImageDimensions, Orientation};
