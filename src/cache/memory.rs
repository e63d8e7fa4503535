//! In-memory persistent-cache implementation.
//!
//! Uses DashMap for lock-free concurrent access.

use dashmap::DashMap;
use parking_lot::RwLock;

use super::ResourceCache;

struct CacheEntry {
    payload: String,
    generation: Option<String>,
}

/// Generation-aware cache held in memory.
///
/// Entries written under a different generation than the active one read as
/// absent.
pub struct MemoryCache {
    entries: DashMap<(String, String), CacheEntry>,
    generation: RwLock<Option<String>>,
}

impl MemoryCache {
    pub fn new(generation: Option<String>) -> Self {
        Self {
            entries: DashMap::new(),
            generation: RwLock::new(generation),
        }
    }

    /// Active cache generation.
    pub fn timestamp(&self) -> Option<String> {
        self.generation.read().clone()
    }

    /// Switch to `timestamp`, dropping every entry if it differs from the
    /// stored generation.
    pub fn handle_actuality(&self, timestamp: &str) {
        let mut generation = self.generation.write();
        if generation.as_deref() != Some(timestamp) {
            self.entries.clear();
            *generation = Some(timestamp.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ResourceCache for MemoryCache {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        let entry = self.entries.get(&(namespace.to_string(), key.to_string()))?;
        if entry.generation != *self.generation.read() {
            return None;
        }
        Some(entry.payload.clone())
    }

    fn set(&self, namespace: &str, key: &str, payload: &str) {
        let generation = self.generation.read().clone();
        self.entries.insert(
            (namespace.to_string(), key.to_string()),
            CacheEntry {
                payload: payload.to_string(),
                generation,
            },
        );
    }

    fn clear(&self, namespace: &str, key: &str) {
        self.entries.remove(&(namespace.to_string(), key.to_string()));
    }
}
