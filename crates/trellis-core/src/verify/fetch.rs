use std::time::Duration;

use url::Url;

use crate::verify::error::VerifyError;

/// Retrieves the body of a remote checksum file
pub trait ChecksumFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<String, VerifyError>;
}

/// Blocking HTTP(S) fetcher backed by `ureq`
#[derive(Debug, Clone)]
pub struct HttpChecksumFetcher {
    agent: ureq::Agent,
}

impl HttpChecksumFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for HttpChecksumFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ChecksumFetcher for HttpChecksumFetcher {
    fn fetch(&self, url: &Url) -> Result<String, VerifyError> {
        let fetch_error = |reason: String| VerifyError::ChecksumFetch {
            url: url.to_string(),
            reason,
        };
        let response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| fetch_error(e.to_string()))?;
        response.into_string().map_err(|e| fetch_error(e.to_string()))
    }
}
