//! Error types for the archiving engine

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for archiving operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Destination already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Source path {} is not under root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("{missing} file(s) could not be archived into {}", destination.display())]
    Incomplete { missing: usize, destination: PathBuf },

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },
}

impl Error {
    /// Map a create-new failure on `path` to `AlreadyExists` when that is the cause
    pub(crate) fn from_create(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::AlreadyExists {
            Error::AlreadyExists {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io(err)
        }
    }
}

/// Result type alias for archiving operations
pub type Result<T> = std::result::Result<T, Error>;
