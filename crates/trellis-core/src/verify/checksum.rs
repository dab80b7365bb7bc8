use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use url::Url;

use crate::config::VerificationConfig;
use crate::verify::context::VerificationContext;
use crate::verify::error::VerifyError;
use crate::verify::fetch::{ChecksumFetcher, HttpChecksumFetcher};
use crate::verify::verifier::Verifier;

const READ_CHUNK: usize = 64 * 1024;

/// Digest used for artifact checksums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Sha256,
    #[default]
    Sha512,
}

impl ChecksumAlgorithm {
    /// Conventional suffix of checksum files for this algorithm
    pub fn default_suffix(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => ".sha256",
            ChecksumAlgorithm::Sha512 => ".sha512",
        }
    }

    /// Lowercase hex digest of a file, read in chunks
    pub fn digest_file(&self, path: &Path) -> Result<String, VerifyError> {
        match self {
            ChecksumAlgorithm::Sha256 => digest_file::<Sha256>(path),
            ChecksumAlgorithm::Sha512 => digest_file::<Sha512>(path),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumAlgorithm::Sha256 => write!(f, "SHA-256"),
            ChecksumAlgorithm::Sha512 => write!(f, "SHA-512"),
        }
    }
}

fn digest_file<D: Digest>(path: &Path) -> Result<String, VerifyError>
where
    sha2::digest::Output<D>: fmt::LowerHex,
{
    let file = File::open(path).map_err(|e| VerifyError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = D::new();
    let mut buffer = vec![0u8; READ_CHUNK];
    loop {
        let read = reader.read(&mut buffer).map_err(|e| VerifyError::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Where the expected checksum comes from
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExpectedChecksum {
    Literal(String),
    Remote(Url),
    LocalFile(PathBuf),
}

/// Compares the artifact digest with the checksum named by the context hint
pub struct ChecksumVerifier {
    algorithm: ChecksumAlgorithm,
    suffix: String,
    fetcher: Arc<dyn ChecksumFetcher>,
}

impl ChecksumVerifier {
    pub fn new(config: &VerificationConfig) -> Self {
        Self::with_fetcher(config, Arc::new(HttpChecksumFetcher::new()))
    }

    pub fn with_fetcher(config: &VerificationConfig, fetcher: Arc<dyn ChecksumFetcher>) -> Self {
        Self {
            algorithm: config.algorithm,
            suffix: config.checksum_suffix.clone(),
            fetcher,
        }
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Replace the extension of the URL's last path segment with the checksum
    /// suffix: `.../plugin-1.0.zip` -> `.../plugin-1.0.sha512`.
    pub fn sibling_url(&self, artifact_url: &str) -> Result<Url, VerifyError> {
        let mut url = Url::parse(artifact_url).map_err(|e| VerifyError::InvalidUrl {
            url: artifact_url.to_string(),
            reason: e.to_string(),
        })?;
        let path = url.path().to_string();
        let (dir, file) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
        if file.is_empty() {
            return Err(VerifyError::InvalidUrl {
                url: artifact_url.to_string(),
                reason: "URL does not name a file".to_string(),
            });
        }
        let stem = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file);
        url.set_path(&format!("{}/{}{}", dir, stem, self.suffix));
        Ok(url)
    }

    /// Checksum file next to a local artifact, used when no URL is known
    fn sibling_path(&self, artifact: &Path) -> PathBuf {
        let stem = artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        artifact.with_file_name(format!("{}{}", stem, self.suffix))
    }

    fn resolve(&self, context: &VerificationContext, path: &Path) -> Result<Option<ExpectedChecksum>, VerifyError> {
        let hint = match context.checksum.as_deref().map(str::trim) {
            Some(hint) if !hint.is_empty() => hint,
            _ => return Ok(None),
        };

        if hint == self.suffix {
            return Ok(Some(match &context.url {
                Some(url) => ExpectedChecksum::Remote(self.sibling_url(url)?),
                None => ExpectedChecksum::LocalFile(self.sibling_path(path)),
            }));
        }

        let lower = hint.to_ascii_lowercase();
        if ["http://", "https://", "file://"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
        {
            let url = Url::parse(hint).map_err(|e| VerifyError::InvalidUrl {
                url: hint.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Some(ExpectedChecksum::Remote(url)));
        }

        Ok(Some(ExpectedChecksum::Literal(hint.to_string())))
    }

    fn expected_value(&self, expected: ExpectedChecksum) -> Result<String, VerifyError> {
        let (source, body) = match expected {
            ExpectedChecksum::Literal(value) => return Ok(value),
            ExpectedChecksum::Remote(url) => {
                debug!("Fetching checksum from {}", url);
                let body = if url.scheme() == "file" {
                    let file = url.to_file_path().map_err(|_| VerifyError::InvalidUrl {
                        url: url.to_string(),
                        reason: "not a local file URL".to_string(),
                    })?;
                    read_checksum_file(&file, url.as_str())?
                } else {
                    self.fetcher.fetch(&url)?
                };
                (url.to_string(), body)
            }
            ExpectedChecksum::LocalFile(file) => {
                debug!("Reading checksum from {}", file.display());
                let source = file.display().to_string();
                let body = read_checksum_file(&file, &source)?;
                (source, body)
            }
        };
        first_token(&body).ok_or_else(|| VerifyError::ChecksumFetch {
            url: source,
            reason: "checksum file is empty".to_string(),
        })
    }
}

fn read_checksum_file(file: &Path, source: &str) -> Result<String, VerifyError> {
    std::fs::read_to_string(file).map_err(|e| VerifyError::ChecksumFetch {
        url: source.to_string(),
        reason: e.to_string(),
    })
}

/// Checksum files usually read `<digest>  <file name>`
fn first_token(body: &str) -> Option<String> {
    body.split_whitespace().next().map(str::to_string)
}

impl Verifier for ChecksumVerifier {
    fn name(&self) -> &'static str {
        "checksum"
    }

    fn verify(&self, context: &VerificationContext, path: &Path) -> Result<(), VerifyError> {
        let Some(expected) = self.resolve(context, path)? else {
            warn!(
                "No checksum given for {} ({}), skipping checksum verification",
                path.display(),
                context.plugin_label()
            );
            return Ok(());
        };

        let expected = self.expected_value(expected)?;
        let actual = self.algorithm.digest_file(path)?;
        if !actual.eq_ignore_ascii_case(&expected) {
            return Err(VerifyError::ChecksumMismatch {
                file: path.to_path_buf(),
                expected,
                actual,
            });
        }
        info!("{} checksum verified for {}", self.algorithm, path.display());
        Ok(())
    }
}
