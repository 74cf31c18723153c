//! Mutable to immutable buffer transfer through a memory-mapped file.
//!
//! [`freeze`] consumes a pixel buffer and returns an equal, immutable one.
//! The pixels are staged in a mapped temporary file so the source can be
//! released before the immutable copy is built; the staged pages are backed
//! by the page cache and can be reclaimed by the OS under pressure, rather
//! than counting as a second anonymous heap allocation.
//!
//! The temporary file is deleted on every exit path.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use memmap2::{MmapMut, MmapOptions};
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;
use tracing::{debug, trace};

use crate::buffer::{checked_byte_len, BufferError, PixelBuffer};
use crate::config::ThumbnailConfig;

const TEMP_PREFIX: &str = "thumbwise-freeze-";

/// Errors that can occur while freezing a buffer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The pixel data does not fit in the address space.
    #[error("Pixel buffer of {width}x{height} is too large to map")]
    TooLarge { width: u32, height: u32 },

    #[error("Failed to create temporary file: {0}")]
    CreateTempFile(#[source] io::Error),

    #[error("Failed to size temporary file: {0}")]
    Resize(#[source] io::Error),

    #[error("Failed to map temporary file: {0}")]
    Map(#[source] io::Error),

    #[error("Failed to remove temporary file: {0}")]
    Cleanup(#[source] io::Error),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Freeze `buffer` using the system temporary directory.
///
/// # Errors
///
/// Any failure to stage the pixels is returned; the source buffer is
/// consumed either way.
pub fn freeze(buffer: PixelBuffer) -> Result<PixelBuffer, TransferError> {
    freeze_in(buffer, &std::env::temp_dir())
}

/// Freeze `buffer` using `config.temp_dir`, or the system temporary directory.
pub fn freeze_with_config(
    buffer: PixelBuffer,
    config: &ThumbnailConfig,
) -> Result<PixelBuffer, TransferError> {
    match config.temp_dir.as_deref() {
        Some(dir) => freeze_in(buffer, dir),
        None => freeze(buffer),
    }
}

/// Freeze `buffer`, staging it in a temporary file inside `dir`.
///
/// Frozen inputs are accepted and produce an equal frozen buffer. Zero-area
/// buffers never touch the filesystem.
///
/// # Arguments
///
/// * `buffer` - Pixels to freeze; consumed and released once staged
/// * `dir` - Directory for the staging file
///
/// # Returns
///
/// An immutable buffer with the same dimensions and pixels.
///
/// # Errors
///
/// Returns the `TransferError` step that failed. The staging file is removed
/// on every path.
pub fn freeze_in(buffer: PixelBuffer, dir: &Path) -> Result<PixelBuffer, TransferError> {
    let (width, height) = buffer.dimensions();
    let len = checked_byte_len(width, height).ok_or(TransferError::TooLarge { width, height })?;

    if len == 0 {
        trace!(width, height, "Freezing empty pixel buffer");
        return Ok(PixelBuffer::frozen(width, height, Arc::from(Vec::new()))?);
    }

    let file = create_staging_file(dir)?;
    debug!(
        path = %file.path().display(),
        width,
        height,
        bytes = len,
        "Freezing pixel buffer through mapped file"
    );

    // On error `file` is dropped here, which deletes it
    let pixels = stage(&file, buffer, len)?;

    let path = file.path().to_path_buf();
    file.close().map_err(TransferError::Cleanup)?;
    trace!(path = %path.display(), "Removed freeze staging file");

    Ok(PixelBuffer::frozen(width, height, pixels)?)
}

fn create_staging_file(dir: &Path) -> Result<NamedTempFile, TransferError> {
    Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)
        .map_err(TransferError::CreateTempFile)
}

/// Size `file` to `len` bytes and map it read-write.
fn map_staging(file: &NamedTempFile, len: u64) -> Result<MmapMut, TransferError> {
    file.as_file().set_len(len).map_err(TransferError::Resize)?;
    map_writable(file.as_file(), len)
}

fn map_writable(file: &File, len: u64) -> Result<MmapMut, TransferError> {
    let len = usize::try_from(len)
        .map_err(|e| TransferError::Map(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

    // SAFETY: staging files are uniquely named, private to this module and
    // never truncated while mapped.
    unsafe { MmapOptions::new().len(len).map_mut(file) }.map_err(TransferError::Map)
}

/// Copy the pixels into the mapped file, release the source and read them
/// back as shared immutable bytes. The mapping is gone when this returns.
fn stage(file: &NamedTempFile, buffer: PixelBuffer, len: usize) -> Result<Arc<[u8]>, TransferError> {
    let mut mmap = map_staging(file, len as u64)?;
    mmap.copy_from_slice(buffer.pixels());
    drop(buffer);

    Ok(Arc::from(&mmap[..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn pattern() -> PixelBuffer {
        #[rustfmt::skip]
        let pixels = vec![
            255, 0, 0, 255,     0, 255, 0, 128,
            0, 0, 255, 0,       1, 2, 3, 4,
        ];
        PixelBuffer::from_rgba(2, 2, pixels).unwrap()
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_known_pattern_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let source = pattern();
        let expected = source.pixels().to_vec();

        let frozen = freeze_in(source, dir.path()).unwrap();
        assert_eq!(frozen.dimensions(), (2, 2));
        assert_eq!(frozen.pixels(), &expected[..]);
    }

    #[test]
    fn test_result_rejects_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let mut frozen = freeze_in(pattern(), dir.path()).unwrap();

        assert!(!frozen.is_mutable());
        assert_eq!(frozen.pixels_mut(), Err(BufferError::Immutable));
    }

    #[test]
    fn test_freezing_frozen_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let once = freeze_in(pattern(), dir.path()).unwrap();
        let twice = freeze_in(once.clone(), dir.path()).unwrap();

        assert_eq!(twice, once);
        assert_eq!(twice, pattern());
        assert!(!twice.is_mutable());
    }

    #[test]
    fn test_staging_file_removed() {
        let dir = tempfile::tempdir().unwrap();
        let frozen = freeze_in(PixelBuffer::new(64, 32).unwrap(), dir.path()).unwrap();

        assert_eq!(frozen.byte_size(), 64 * 32 * 4);
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let err = freeze_in(pattern(), &missing).unwrap_err();
        assert!(matches!(err, TransferError::CreateTempFile(_)));
        assert!(!missing.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_zero_area_skips_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let frozen = freeze_in(PixelBuffer::new(0, 5).unwrap(), &missing).unwrap();
        assert_eq!(frozen.dimensions(), (0, 5));
        assert!(frozen.is_empty());
        assert!(!frozen.is_mutable());
    }

    #[test]
    fn test_config_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ThumbnailConfig::default();
        config.temp_dir = Some(dir.path().to_path_buf());

        let frozen = freeze_with_config(pattern(), &config).unwrap();
        assert_eq!(frozen, pattern());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_system_temp_dir() {
        let frozen = freeze(pattern()).unwrap();
        assert_eq!(frozen, pattern());
    }

    #[test]
    fn test_staging_file_is_prefixed() {
        let dir = tempfile::tempdir().unwrap();
        let file = create_staging_file(dir.path()).unwrap();

        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(TEMP_PREFIX), "unexpected name {name}");
        assert_eq!(file.path().parent(), Some(dir.path()));
    }

    #[test]
    fn test_resize_failure_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = create_staging_file(dir.path()).unwrap();
        assert_eq!(entries(dir.path()), 1);

        // No filesystem accepts a length past i64::MAX
        let err = map_staging(&file, u64::MAX).unwrap_err();
        assert!(matches!(err, TransferError::Resize(_)));

        drop(file);
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_map_failure_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = create_staging_file(dir.path()).unwrap();
        file.as_file().set_len(16).unwrap();

        // A writable shared mapping needs a writable descriptor
        let read_only = File::open(file.path()).unwrap();
        let err = map_writable(&read_only, 16).unwrap_err();
        assert!(matches!(err, TransferError::Map(_)));

        drop(read_only);
        drop(file);
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_staged_mapping_has_requested_length() {
        let dir = tempfile::tempdir().unwrap();
        let file = create_staging_file(dir.path()).unwrap();

        let mmap = map_staging(&file, 64).unwrap();
        assert_eq!(mmap.len(), 64);
        assert_eq!(file.as_file().metadata().unwrap().len(), 64);
    }

    #[test]
    #[traced_test]
    fn test_logs_staging() {
        let dir = tempfile::tempdir().unwrap();
        freeze_in(pattern(), dir.path()).unwrap();

        assert!(logs_contain("Freezing pixel buffer through mapped file"));
        assert!(logs_contain("Removed freeze staging file"));
    }
}
