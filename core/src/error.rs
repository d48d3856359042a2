use std::path::PathBuf;
use thiserror::Error;

use crate::violation::Violation;

#[derive(Debug, Error)]
pub enum FsckError {
    #[error("image not found: {}", path.display())]
    ImageNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("Decode error: {what} at byte {offset} (+{len}) lies outside the {image_len}-byte image")]
    Decode {
        what: &'static str,
        offset: u64,
        len: usize,
        image_len: usize,
    },

    #[error("ERROR: {0}")]
    Violation(#[from] Violation),
}

impl FsckError {
    /// True when the image decoded cleanly but broke one of the consistency rules.
    pub fn is_violation(&self) -> bool {
        matches!(self, FsckError::Violation(_))
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            FsckError::Violation(v) => Some(v),
            _ => None,
        }
    }
}

pub type FsckResult<T> = Result<T, FsckError>;
