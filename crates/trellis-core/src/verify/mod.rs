//! # Trellis Core Artifact Verification
//!
//! A plugin package is checked by a chain of [`Verifier`]s before it is
//! registered. [`CompoundVerifier`] runs them in order and stops at the first
//! failure; [`default_pipeline`] builds the usual chain of [`BasicVerifier`]
//! (the file exists and is not empty) followed by [`ChecksumVerifier`].
//!
//! Verification is blocking and sets no timeout of its own. Callers that need
//! one run it on a blocking thread and bound it from outside.

pub mod basic;
pub mod checksum;
pub mod context;
pub mod error;
pub mod fetch;
pub mod verifier;

use std::sync::Arc;

pub use basic::BasicVerifier;
pub use checksum::{ChecksumAlgorithm, ChecksumVerifier};
pub use context::VerificationContext;
pub use error::VerifyError;
pub use fetch::{ChecksumFetcher, HttpChecksumFetcher};
pub use verifier::{CompoundVerifier, Verifier};

use crate::config::VerificationConfig;

/// Basic checks followed by checksum verification, fetching over HTTP
pub fn default_pipeline(config: &VerificationConfig) -> CompoundVerifier {
    CompoundVerifier::new()
        .with(BasicVerifier)
        .with(ChecksumVerifier::new(config))
}

/// Same chain as [`default_pipeline`] with a caller-supplied fetcher
pub fn pipeline_with_fetcher(
    config: &VerificationConfig,
    fetcher: Arc<dyn ChecksumFetcher>,
) -> CompoundVerifier {
    CompoundVerifier::new()
        .with(BasicVerifier)
        .with(ChecksumVerifier::with_fetcher(config, fetcher))
}
