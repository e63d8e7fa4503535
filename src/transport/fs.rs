//! Filesystem transport rooted at the client's document root.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{strip_query, Transport, TransportError};

/// Serves files below a root directory.
///
/// Requests that resolve outside the root are refused.
pub struct FsTransport {
    root: PathBuf,
    base_path: String,
}

impl FsTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_path: String::new(),
        }
    }

    /// Prefix stripped from every URL before it is mapped onto the root.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Map a URL onto a canonical file path within the root.
    pub fn validate_path(&self, url: &str) -> Result<PathBuf, TransportError> {
        let path = strip_query(url);
        let relative = path.strip_prefix(self.base_path.as_str()).unwrap_or(path);
        let relative = relative.trim_start_matches('/');

        let full_path = self.root.join(relative);
        let canonical = full_path
            .canonicalize()
            .map_err(|_| TransportError::NotFound(relative.to_string()))?;
        let root = self.root.canonicalize()?;

        if !canonical.starts_with(&root) {
            return Err(TransportError::PathNotAllowed(canonical));
        }

        Ok(canonical)
    }
}

#[async_trait]
impl Transport for FsTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let path = self.validate_path(url)?;
        Ok(tokio::fs::read_to_string(path).await?)
    }
}
