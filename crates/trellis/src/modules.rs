//! Module-set files: a list of module descriptors for `trellis order`.
//!
//! ```toml
//! [[modules]]
//! name = "web"
//! version = "1.2.0"
//! dependencies = ["core@^1.0", "metrics?"]
//! ```
use std::path::Path;

use serde::Deserialize;
use trellis_core::config::{load_file, ConfigError};
use trellis_core::{ModuleDependency, ModuleDescriptor};

#[derive(Debug, Deserialize)]
pub struct ModuleSet {
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub dependencies: Vec<ModuleDependency>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

fn default_enabled() -> bool {
    true
}

impl ModuleSet {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_file(path)
    }

    pub fn into_descriptors(self) -> Vec<ModuleDescriptor> {
        self.modules
            .into_iter()
            .map(|entry| {
                ModuleDescriptor::builder(&entry.name)
                    .version(&entry.version)
                    .enabled(entry.enabled)
                    .order(entry.order)
                    .dependencies(entry.dependencies)
                    .build()
            })
            .collect()
    }
}
