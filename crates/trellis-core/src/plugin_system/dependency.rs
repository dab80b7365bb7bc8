use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::plugin_system::error::RegistryError;
use crate::plugin_system::version::VersionRange;

/// Marks a dependency as optional in the compact textual form
const OPTIONAL_MARKER: char = '?';
/// Separates the module name from its version constraint
const VERSION_SEPARATOR: char = '@';

/// A dependency of one module on another
///
/// The compact textual form is `name`, `name@<req>`, `name?` or `name?@<req>`,
/// where `?` marks the dependency optional and `<req>` is a semver constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleDependency {
    pub name: String,
    /// `None` accepts any version
    pub version_range: Option<VersionRange>,
    /// Optional dependencies may be missing at validation time
    pub required: bool,
}

impl ModuleDependency {
    fn new(name: &str, version_range: Option<VersionRange>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            version_range,
            required,
        }
    }

    /// Hard dependency on `name` within `version_range`
    pub fn required(name: &str, version_range: VersionRange) -> Self {
        Self::new(name, Some(version_range), true)
    }

    /// Hard dependency on any version of `name`
    pub fn required_any(name: &str) -> Self {
        Self::new(name, None, true)
    }

    /// Used when present, within `version_range`; ignored when absent
    pub fn optional(name: &str, version_range: VersionRange) -> Self {
        Self::new(name, Some(version_range), false)
    }

    pub fn optional_any(name: &str) -> Self {
        Self::new(name, None, false)
    }

    /// Whether a module at `version` satisfies this dependency
    pub fn is_compatible_with(&self, version: &str) -> bool {
        self.version_range
            .as_ref()
            .map_or(true, |range| range.includes_str(version))
    }
}

impl FromStr for ModuleDependency {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| RegistryError::InvalidDependency {
            declaration: s.to_string(),
            reason,
        };

        let (name_part, constraint) = match s.split_once(VERSION_SEPARATOR) {
            Some((name, constraint)) => (name, Some(constraint)),
            None => (s, None),
        };
        let name_part = name_part.trim();
        let (name, required) = match name_part.strip_suffix(OPTIONAL_MARKER) {
            Some(name) => (name.trim_end(), false),
            None => (name_part, true),
        };

        if name.is_empty() {
            return Err(invalid("module name is empty".to_string()));
        }
        if name.chars().any(|c| c.is_whitespace() || c == OPTIONAL_MARKER) {
            return Err(invalid(format!("'{}' is not a valid module name", name)));
        }

        let version_range = match constraint {
            Some(c) => Some(VersionRange::from_constraint(c).map_err(|e| invalid(e.to_string()))?),
            None => None,
        };

        Ok(Self {
            name: name.to_string(),
            version_range,
            required,
        })
    }
}

impl TryFrom<String> for ModuleDependency {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleDependency> for String {
    fn from(dependency: ModuleDependency) -> Self {
        dependency.to_string()
    }
}

/// Writes the compact textual form, so `to_string()` round-trips through `parse()`.
impl fmt::Display for ModuleDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.required {
            write!(f, "{}", OPTIONAL_MARKER)?;
        }
        if let Some(range) = &self.version_range {
            write!(f, "{}{}", VERSION_SEPARATOR, range.constraint_string())?;
        }
        Ok(())
    }
}
