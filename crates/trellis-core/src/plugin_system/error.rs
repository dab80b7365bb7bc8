//! # Trellis Core Module Registry Errors
//!
//! Defines [`RegistryError`], returned by every fallible registry operation.
//! Registration conflicts, unknown names, unresolved or version-incompatible
//! dependencies, dependency cycles and illegal lifecycle transitions each get
//! their own variant so hosts can report install/start failures per module.
use thiserror::Error;

use crate::plugin_system::descriptor::ModuleState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Module already registered: {0}")]
    DuplicateModule(String),

    #[error("Module not registered: {0}")]
    UnknownModule(String),

    #[error("Module '{module}' depends on '{dependency}', which is not registered")]
    MissingDependency { module: String, dependency: String },

    /// Names the modules that could not be ordered
    #[error("Circular dependency detected among modules: {}", .0.join(", "))]
    CyclicDependency(Vec<String>),

    #[error("Module version mismatch: '{module}' requires '{dependency}' version '{required}' but found '{actual}'")]
    IncompatibleVersion {
        module: String,
        dependency: String,
        required: String,
        actual: String,
    },

    #[error("Module '{module}' cannot move from {from} to {to}")]
    InvalidStateTransition {
        module: String,
        from: ModuleState,
        to: ModuleState,
    },

    #[error("Invalid dependency declaration '{declaration}': {reason}")]
    InvalidDependency { declaration: String, reason: String },
}
