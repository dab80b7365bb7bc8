//! # Trellis Core Module Registry
//!
//! Keeps track of registered modules (plugins), their declared dependencies and
//! their lifecycle state, and turns the dependency declarations into a
//! validated startup order.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`descriptor`]**: [`ModuleDescriptor`] and its builder, the
//!   [`ModuleState`] machine and the derived [`ModuleHealth`].
//! - **[`dependency`]**: [`ModuleDependency`], a named dependency with an
//!   optional semver constraint, parsed from `name`, `name@req` or `name?`.
//! - **[`version`]**: semver helpers ([`VersionRange`]).
//! - **[`registry`]**: [`ModuleRegistry`], the thread-safe store that validates
//!   dependencies through the [`graph`](crate::graph) engine and computes
//!   startup/shutdown order.
//! - **[`error`]**: [`RegistryError`].
//!
//! The registry never starts or stops anything itself. A host container drives
//! lifecycle transitions and reports them through
//! [`ModuleRegistry::update_state`].
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod version;

pub use dependency::ModuleDependency;
pub use descriptor::{ModuleDescriptor, ModuleDescriptorBuilder, ModuleHealth, ModuleState};
pub use error::RegistryError;
pub use registry::ModuleRegistry;
pub use version::{VersionError, VersionRange};

// Test module declaration
#[cfg(test)]
mod tests;
