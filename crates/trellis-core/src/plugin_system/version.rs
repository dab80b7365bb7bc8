use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A version or version requirement that is not valid semver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Invalid version '{version}': {message}")]
    InvalidVersion { version: String, message: String },
    #[error("Invalid version constraint '{constraint}': {message}")]
    InvalidConstraint { constraint: String, message: String },
}

/// Parse a module version string as semver.
pub fn parse_version(version: &str) -> Result<Version, VersionError> {
    Version::parse(version.trim()).map_err(|e| VersionError::InvalidVersion {
        version: version.to_string(),
        message: e.to_string(),
    })
}

/// A semver requirement on a dependency's version (`^1.2`, `>=2, <3`).
///
/// The text is kept as written so errors and the compact dependency form echo
/// what the user declared. Equality compares the parsed requirement.
#[derive(Debug, Clone)]
pub struct VersionRange {
    constraint: String,
    req: VersionReq,
}

impl VersionRange {
    /// Parse a requirement; surrounding whitespace is ignored.
    pub fn from_constraint(constraint: &str) -> Result<Self, VersionError> {
        let constraint = constraint.trim();
        let req = VersionReq::parse(constraint).map_err(|e| VersionError::InvalidConstraint {
            constraint: constraint.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            constraint: constraint.to_string(),
            req,
        })
    }

    /// Whether `version` satisfies the requirement
    pub fn includes(&self, version: &Version) -> bool {
        self.req.matches(version)
    }

    /// Like [`includes`](Self::includes) for a version string. Strings that are
    /// not valid semver never match.
    pub fn includes_str(&self, version: &str) -> bool {
        match parse_version(version) {
            Ok(v) => self.includes(&v),
            Err(e) => {
                log::warn!("Treating unparsable version as incompatible with '{}': {}", self.constraint, e);
                false
            }
        }
    }

    /// The requirement as written
    pub fn constraint_string(&self) -> &str {
        &self.constraint
    }
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.req == other.req
    }
}

impl Eq for VersionRange {}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.constraint)
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(constraint: &str) -> Result<Self, Self::Err> {
        Self::from_constraint(constraint)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.constraint)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let constraint = String::deserialize(deserializer)?;
        VersionRange::from_constraint(&constraint).map_err(serde::de::Error::custom)
    }
}
