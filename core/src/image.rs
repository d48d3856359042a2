// Read-only image buffer
// The whole image is loaded once and every record is sliced out of it with a bounds check.

use crate::error::{FsckError, FsckResult};
use log::debug;
use std::path::{Path, PathBuf};

/// A filesystem image held in memory for the duration of one check.
#[derive(Debug, Clone)]
pub struct ImageFile {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl ImageFile {
    /// Load the image at `path`. Any failure to open or read it is reported as `ImageNotFound`.
    pub fn open<P: AsRef<Path>>(path: P) -> FsckResult<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path).map_err(|source| FsckError::ImageNotFound {
            path: path.clone(),
            source,
        })?;
        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Self { path, bytes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Borrow `len` bytes at `offset`, or fail with a decode error naming `what` was being read.
pub fn region<'a>(bytes: &'a [u8], offset: u64, len: usize, what: &'static str) -> FsckResult<&'a [u8]> {
    let out_of_bounds = || FsckError::Decode {
        what,
        offset,
        len,
        image_len: bytes.len(),
    };

    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
    bytes.get(start..end).ok_or_else(out_of_bounds)
}
