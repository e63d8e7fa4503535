//! Cache layer consulted before the transport.
//!
//! Two independent stores:
//! - a persistent [`ResourceCache`] keyed by (namespace, logical name) and
//!   tied to a cache generation;
//! - an ephemeral [`ResponseCache`] keyed by absolute URL. When present it
//!   replaces the persistent cache on the read and write path.

mod file;
mod memory;
mod response;

pub use file::{CacheError, FileCache};
pub use memory::MemoryCache;
pub use response::MemoryResponseCache;

use async_trait::async_trait;

/// Namespace the loader stores fetched scripts and resources under.
pub const APP_NAMESPACE: &str = "a";

/// Persistent key/value cache. Misses are `None`, never errors.
pub trait ResourceCache: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Option<String>;

    fn set(&self, namespace: &str, key: &str, payload: &str);

    fn clear(&self, namespace: &str, key: &str);
}

/// Durable request/response cache keyed by URL.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn match_url(&self, url: &str) -> Option<String>;

    async fn put(&self, url: &str, body: &str);
}
