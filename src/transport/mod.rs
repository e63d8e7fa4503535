//! Transport: fetches raw text by URL when no cache answered.

mod fs;
mod memory;

pub use fs::FsTransport;
pub use memory::{FetchGate, MemoryTransport};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Path not allowed: {0}")]
    PathNotAllowed(PathBuf),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches raw text. No retries at this layer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

/// Append the cache-busting `r=<token>` query parameter.
pub fn with_cache_busting(path: &str, token: Option<&str>) -> String {
    match token {
        Some(token) => {
            let separator = if path.contains('?') { '&' } else { '?' };
            format!("{path}{separator}r={token}")
        }
        None => path.to_string(),
    }
}

/// The part of a URL before its query string.
pub fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}
