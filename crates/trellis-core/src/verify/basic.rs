use std::path::Path;

use crate::verify::context::VerificationContext;
use crate::verify::error::VerifyError;
use crate::verify::verifier::Verifier;

/// Rejects anything that is not a non-empty regular file
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicVerifier;

impl Verifier for BasicVerifier {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn verify(&self, _context: &VerificationContext, path: &Path) -> Result<(), VerifyError> {
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() && metadata.len() > 0 => Ok(()),
            _ => Err(VerifyError::NotARegularFileOrEmpty(path.to_path_buf())),
        }
    }
}
