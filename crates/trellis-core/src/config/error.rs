use std::path::PathBuf;

use thiserror::Error;

use crate::config::format::ConfigFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown or unsupported config format for path: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to deserialize from {format}: {message}")]
    Deserialize { format: ConfigFormat, message: String },

    #[error("Failed to serialize to {format}: {message}")]
    Serialize { format: ConfigFormat, message: String },
}
