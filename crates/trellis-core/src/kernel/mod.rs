//! # Trellis Core Kernel
//!
//! Ties the subsystems together.
//!
//! - **Lifecycle**: [`PluginLifecycle`](bootstrap::PluginLifecycle) verifies
//!   plugin artifacts, registers their descriptors, resolves the startup order
//!   and discovers extensions for enabled modules.
//! - **Core Constants**: application name/version and config lookup defaults in
//!   the `constants` submodule.
//! - **Error Handling**: the crate-wide [`Error`](error::Error) and a `Result`
//!   alias in the `error` submodule.
pub mod bootstrap;
pub mod constants;
pub mod error;

pub use bootstrap::PluginLifecycle;
pub use error::{Error, LifecyclePhase, Result};
