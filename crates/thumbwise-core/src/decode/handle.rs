//! Addressable sources of encoded image bytes.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A reference to encoded image bytes, either on disk or already in memory.
///
/// Handles are never modified by the pipeline and can be reused for any
/// number of calls.
#[derive(Clone)]
pub enum ImageHandle {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

impl ImageHandle {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ImageHandle::Path(path.into())
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        ImageHandle::Memory(bytes.into())
    }

    /// Open a fresh buffered, seekable reader positioned at the start.
    pub fn open(&self) -> io::Result<HandleReader<'_>> {
        match self {
            ImageHandle::Path(path) => Ok(HandleReader::File(BufReader::new(File::open(path)?))),
            ImageHandle::Memory(bytes) => Ok(HandleReader::Memory(Cursor::new(&bytes[..]))),
        }
    }

    /// Filesystem path, if this handle points to one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageHandle::Path(path) => Some(path),
            ImageHandle::Memory(_) => None,
        }
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageHandle::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImageHandle::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageHandle::Path(path) => write!(f, "{}", path.display()),
            ImageHandle::Memory(bytes) => write!(f, "<memory:{} bytes>", bytes.len()),
        }
    }
}

impl From<PathBuf> for ImageHandle {
    fn from(path: PathBuf) -> Self {
        ImageHandle::Path(path)
    }
}

impl From<&Path> for ImageHandle {
    fn from(path: &Path) -> Self {
        ImageHandle::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageHandle {
    fn from(bytes: Vec<u8>) -> Self {
        ImageHandle::Memory(bytes.into())
    }
}

/// Reader returned by [`ImageHandle::open`].
pub enum HandleReader<'a> {
    File(BufReader<File>),
    Memory(Cursor<&'a [u8]>),
}

impl Read for HandleReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            HandleReader::File(r) => r.read(buf),
            HandleReader::Memory(r) => r.read(buf),
        }
    }
}

impl BufRead for HandleReader<'_> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            HandleReader::File(r) => r.fill_buf(),
            HandleReader::Memory(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            HandleReader::File(r) => r.consume(amt),
            HandleReader::Memory(r) => r.consume(amt),
        }
    }
}

impl Seek for HandleReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            HandleReader::File(r) => r.seek(pos),
            HandleReader::Memory(r) => r.seek(pos),
        }
    }
}
