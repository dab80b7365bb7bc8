//! # Trellis Core Kernel Errors
//!
//! [`Error`] is the crate-wide error. Each subsystem keeps its own typed error
//! ([`RegistryError`], [`VerifyError`], [`ScanError`], [`ConfigError`]) and
//! converts into [`Error`] with `?`. Failures raised by the lifecycle facade
//! itself carry the [`LifecyclePhase`] they happened in.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::extension::ScanError;
use crate::plugin_system::RegistryError;
use crate::verify::VerifyError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Module registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Verification failed: {0}")]
    Verification(#[from] VerifyError),

    #[error("Extension scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A module failed while the lifecycle was driving it
    #[error("Lifecycle error during {phase} of '{module}': {message}")]
    Lifecycle {
        phase: LifecyclePhase,
        module: String,
        message: String,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Step of the plugin lifecycle an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum LifecyclePhase {
    #[error("Install")]
    Install,
    #[error("Resolve")]
    Resolve,
    #[error("Discover")]
    Discover,
    #[error("Start")]
    Start,
    #[error("Stop")]
    Stop,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    pub fn lifecycle(phase: LifecyclePhase, module: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Lifecycle {
            phase,
            module: module.into(),
            message: message.into(),
        }
    }

    /// Registry error behind this error, if any
    pub fn as_registry_error(&self) -> Option<&RegistryError> {
        match self {
            Error::Registry(e) => Some(e),
            _ => None,
        }
    }
}
