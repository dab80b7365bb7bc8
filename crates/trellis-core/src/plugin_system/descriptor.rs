use std::fmt;

use serde::{Deserialize, Serialize};

use crate::plugin_system::dependency::ModuleDependency;

/// Lifecycle state of a registered module.
///
/// The host container drives every transition; the registry only records them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    Registered,
    Starting,
    Started,
    Stopping,
    Stopped,
    Failed,
}

impl ModuleState {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: ModuleState) -> bool {
        use ModuleState::*;
        matches!(
            (self, next),
            (Registered, Starting)
                | (Starting, Started)
                | (Starting, Failed)
                | (Started, Stopping)
                | (Started, Failed)
                | (Stopping, Stopped)
                | (Stopping, Failed)
                | (Stopped, Starting)
                | (Failed, Starting)
                | (Failed, Stopping)
        )
    }

    /// Only a started module reports healthy.
    pub fn is_healthy(self) -> bool {
        self == ModuleState::Started
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModuleState::Registered => "REGISTERED",
            ModuleState::Starting => "STARTING",
            ModuleState::Started => "STARTED",
            ModuleState::Stopping => "STOPPING",
            ModuleState::Stopped => "STOPPED",
            ModuleState::Failed => "FAILED",
        };
        write!(f, "{}", label)
    }
}

/// Describes a registrable module and carries its current lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    name: String,
    version: String,
    enabled: bool,
    dependencies: Vec<ModuleDependency>,
    /// Tie-break hint for startup ordering, lower starts first
    order: i32,
    state: ModuleState,
}

impl ModuleDescriptor {
    /// Start building a descriptor for the module `name`
    pub fn builder(name: &str) -> ModuleDescriptorBuilder {
        ModuleDescriptorBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dependencies(&self) -> &[ModuleDependency] {
        &self.dependencies
    }

    /// Names of every declared dependency, optional ones included
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|dep| dep.name.as_str())
    }

    /// Whether this module declares a dependency (of any kind) on `name`
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|dep| dep.name == name)
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ModuleState) {
        self.state = state;
    }
}

/// Builder for [`ModuleDescriptor`]
#[derive(Debug, Clone)]
pub struct ModuleDescriptorBuilder {
    descriptor: ModuleDescriptor,
}

impl ModuleDescriptorBuilder {
    /// Create a new builder. Defaults: version `0.0.0`, enabled, order 0, no dependencies.
    pub fn new(name: &str) -> Self {
        Self {
            descriptor: ModuleDescriptor {
                name: name.to_string(),
                version: "0.0.0".to_string(),
                enabled: true,
                dependencies: Vec::new(),
                order: 0,
                state: ModuleState::Registered,
            },
        }
    }

    /// Set the module version
    pub fn version(mut self, version: &str) -> Self {
        self.descriptor.version = version.to_string();
        self
    }

    /// Set whether the module is enabled
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.descriptor.enabled = enabled;
        self
    }

    /// Set the startup tie-break hint
    pub fn order(mut self, order: i32) -> Self {
        self.descriptor.order = order;
        self
    }

    /// Add a required dependency on any version of `name`
    pub fn depends_on(self, name: &str) -> Self {
        self.dependency(ModuleDependency::required_any(name))
    }

    /// Add a dependency. Declaring the same module twice keeps the later declaration.
    pub fn dependency(mut self, dependency: ModuleDependency) -> Self {
        let deps = &mut self.descriptor.dependencies;
        match deps.iter_mut().find(|existing| existing.name == dependency.name) {
            Some(existing) => *existing = dependency,
            None => deps.push(dependency),
        }
        self
    }

    /// Add multiple dependencies
    pub fn dependencies<I>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = ModuleDependency>,
    {
        for dependency in dependencies {
            self = self.dependency(dependency);
        }
        self
    }

    /// Build the descriptor. Every new descriptor starts in [`ModuleState::Registered`].
    pub fn build(self) -> ModuleDescriptor {
        self.descriptor
    }
}

/// Health snapshot derived from a module's lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleHealth {
    pub name: String,
    pub state: ModuleState,
    pub healthy: bool,
}

impl From<&ModuleDescriptor> for ModuleHealth {
    fn from(descriptor: &ModuleDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            state: descriptor.state,
            healthy: descriptor.state.is_healthy(),
        }
    }
}
