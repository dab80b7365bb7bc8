use std::path::Path;

use log::debug;

use crate::verify::context::VerificationContext;
use crate::verify::error::VerifyError;

/// One check applied to a downloaded artifact before it is activated
pub trait Verifier: Send + Sync {
    /// Short name for log output
    fn name(&self) -> &'static str;

    fn verify(&self, context: &VerificationContext, path: &Path) -> Result<(), VerifyError>;
}

/// Runs verifiers in order and stops at the first failure
#[derive(Default)]
pub struct CompoundVerifier {
    verifiers: Vec<Box<dyn Verifier>>,
}

impl CompoundVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, verifier: impl Verifier + 'static) -> Self {
        self.verifiers.push(Box::new(verifier));
        self
    }

    pub fn add(&mut self, verifier: Box<dyn Verifier>) {
        self.verifiers.push(verifier);
    }

    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }

    /// Verifier names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.verifiers.iter().map(|v| v.name()).collect()
    }
}

impl Verifier for CompoundVerifier {
    fn name(&self) -> &'static str {
        "compound"
    }

    fn verify(&self, context: &VerificationContext, path: &Path) -> Result<(), VerifyError> {
        for verifier in &self.verifiers {
            debug!(
                "Running {} verifier on {} ({})",
                verifier.name(),
                path.display(),
                context.plugin_label()
            );
            verifier.verify(context, path)?;
        }
        Ok(())
    }
}
