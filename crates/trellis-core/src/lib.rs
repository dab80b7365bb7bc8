//! # Trellis Core
//!
//! Plugin lifecycle core: a dependency graph engine, a module registry built on
//! it, an extension scanner that reads compiled class files without loading
//! them, and a verification pipeline for downloaded plugin packages.
//!
//! The pieces are independent and can be used on their own; the
//! [`PluginLifecycle`] facade strings them together in the usual order:
//! verify, register, resolve, discover.
pub mod config;
pub mod extension;
pub mod graph;
pub mod kernel;
pub mod plugin_system;
pub mod verify;

// Re-export key public types for easier use by the binary and hosts
pub use config::{ConfigError, ConfigFormat, CoreConfig};
pub use extension::{ExtensionDescriptor, ExtensionScanner};
pub use graph::{DirectedGraph, GraphError};
pub use kernel::error::Error as KernelError;
pub use kernel::PluginLifecycle;
pub use plugin_system::{ModuleDependency, ModuleDescriptor, ModuleRegistry, ModuleState, RegistryError};
pub use verify::{VerificationContext, Verifier, VerifyError};
