//! In-memory URL-keyed response cache.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::ResponseCache;

/// Response bodies keyed by the exact fetch URL.
pub struct MemoryResponseCache {
    responses: DashMap<String, String>,
    generation: RwLock<Option<String>>,
}

impl MemoryResponseCache {
    pub fn new() -> Self {
        Self {
            responses: DashMap::new(),
            generation: RwLock::new(None),
        }
    }

    /// Drop every response unless `timestamp` matches the stored generation.
    pub fn handle_actuality(&self, timestamp: &str) {
        let mut generation = self.generation.write();
        if generation.as_deref() != Some(timestamp) {
            self.responses.clear();
            *generation = Some(timestamp.to_string());
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.responses.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl Default for MemoryResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn match_url(&self, url: &str) -> Option<String> {
        self.responses.get(url).map(|body| body.clone())
    }

    async fn put(&self, url: &str, body: &str) {
        self.responses.insert(url.to_string(), body.to_string());
    }
}
