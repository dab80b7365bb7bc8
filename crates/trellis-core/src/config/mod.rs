//! # Trellis Core Configuration
//!
//! Tunables for the verification pipeline and the extension scanner, loadable
//! from JSON, TOML (`toml-config` feature) or YAML (`yaml-config` feature)
//! files. Every key is optional; anything left out keeps its default.
//!
//! ```toml
//! [verification]
//! algorithm = "sha512"
//! checksum_suffix = ".sha512"
//!
//! [scanner]
//! annotation = "org.pf4j.Extension"
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};

pub mod error;
pub mod format;

pub use error::ConfigError;
pub use format::{load_file, ConfigFormat};

use crate::verify::ChecksumAlgorithm;

/// Top-level configuration for the core
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub verification: VerificationConfig,
    pub scanner: ScannerConfig,
}

impl CoreConfig {
    /// Load from a file whose extension selects the format
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_file(path)
    }

    /// Parse from a string in the given format
    pub fn from_str_with_format(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        format.parse(data)
    }
}

/// Settings for the artifact checksum verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Digest used for artifact checksums
    pub algorithm: ChecksumAlgorithm,
    /// Suffix of sibling checksum files. The same string, used as a checksum
    /// hint, asks the verifier to derive the checksum URL from the artifact URL.
    pub checksum_suffix: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        let algorithm = ChecksumAlgorithm::default();
        Self {
            algorithm,
            checksum_suffix: algorithm.default_suffix().to_string(),
        }
    }
}

/// Settings for the extension scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Fully-qualified name of the marker annotation
    pub annotation: String,
    /// Integer element holding the extension ordinal
    pub ordinal_attribute: String,
    /// String (or string array) element listing target plugin ids
    pub plugins_attribute: String,
    /// Class (or class array) element listing extension points
    pub points_attribute: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            annotation: "org.pf4j.Extension".to_string(),
            ordinal_attribute: "ordinal".to_string(),
            plugins_attribute: "plugins".to_string(),
            points_attribute: "points".to_string(),
        }
    }
}
