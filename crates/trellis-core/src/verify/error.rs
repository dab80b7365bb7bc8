use std::path::PathBuf;

use thiserror::Error;

/// Why an artifact was rejected
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Artifact '{0}' is not a regular file or is empty")]
    NotARegularFileOrEmpty(PathBuf),

    #[error("Checksum mismatch for '{file}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Failed to fetch checksum from '{url}': {reason}")]
    ChecksumFetch { url: String, reason: String },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl VerifyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VerifyError::Io {
            path: path.into(),
            source,
        }
    }
}
