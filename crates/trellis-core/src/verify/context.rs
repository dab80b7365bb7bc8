/// What a verifier knows about the artifact besides its bytes on disk.
///
/// `checksum` is a hint, resolved by [`ChecksumVerifier`](super::ChecksumVerifier):
/// the configured checksum suffix (derive a sibling URL from `url`), an
/// `http(s)://` checksum-file URL, a literal hex digest, or nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationContext {
    pub url: Option<String>,
    pub checksum: Option<String>,
    pub plugin_id: Option<String>,
    pub plugin_version: Option<String>,
}

impl VerificationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn with_plugin(mut self, id: impl Into<String>, version: impl Into<String>) -> Self {
        self.plugin_id = Some(id.into());
        self.plugin_version = Some(version.into());
        self
    }

    /// `id@version`, or whichever part is known, for log lines
    pub fn plugin_label(&self) -> String {
        match (&self.plugin_id, &self.plugin_version) {
            (Some(id), Some(version)) => format!("{}@{}", id, version),
            (Some(id), None) => id.clone(),
            (None, Some(version)) => format!("<unnamed>@{}", version),
            (None, None) => "<unnamed>".to_string(),
        }
    }
}
