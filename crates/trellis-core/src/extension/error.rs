//! # Trellis Core Extension Scan Errors
//!
//! [`ScanError`] describes why a single class (or a whole archive) could not be
//! inspected. Per-class scan errors are logged and swallowed by the batch
//! scanning functions; only failing to open or list an archive is reported to
//! the caller.
use std::path::PathBuf;

use thiserror::Error;

use crate::extension::class_file::ClassFormatError;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to read class '{class_name}': {source}")]
    Io {
        class_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed class file for '{class_name}': {source}")]
    Malformed {
        class_name: String,
        #[source]
        source: ClassFormatError,
    },

    #[error("Failed to list classes in '{path}': {source}")]
    Index {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
