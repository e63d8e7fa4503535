//! File-backed persistent cache.
//!
//! One JSON file per entry, named by the SHA-256 of namespace and key. The
//! active generation is kept in a `timestamp` file next to the entries.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::ResourceCache;

const STAMP_FILE: &str = "timestamp";
const ENTRY_EXTENSION: &str = "json";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache directory unavailable: {0}")]
    Directory(PathBuf),

    #[error("Malformed cache entry: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    generation: Option<String>,
    namespace: String,
    key: String,
    payload: String,
}

/// Persistent cache stored in a directory.
pub struct FileCache {
    dir: PathBuf,
    generation: RwLock<Option<String>>,
}

impl FileCache {
    /// Open (creating if needed) a cache directory. The generation is read
    /// from the stamp file when present.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        if !dir.is_dir() {
            return Err(CacheError::Directory(dir));
        }
        let generation = match fs::read_to_string(dir.join(STAMP_FILE)) {
            Ok(stamp) => Some(stamp.trim().to_string()).filter(|s| !s.is_empty()),
            Err(_) => None,
        };
        Ok(Self {
            dir,
            generation: RwLock::new(generation),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generation recorded in the stamp file.
    pub fn timestamp(&self) -> Option<String> {
        self.generation.read().clone()
    }

    /// Switch to `timestamp`, removing every entry if it differs from the
    /// stored generation, then record it.
    pub fn handle_actuality(&self, timestamp: &str) -> Result<(), CacheError> {
        let mut generation = self.generation.write();
        if generation.as_deref() == Some(timestamp) {
            return Ok(());
        }
        self.remove_entries()?;
        fs::write(self.dir.join(STAMP_FILE), timestamp)?;
        *generation = Some(timestamp.to_string());
        Ok(())
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update([0u8]);
        hasher.update(key.as_bytes());
        let name = hex::encode(hasher.finalize());
        self.dir.join(format!("{name}.{ENTRY_EXTENSION}"))
    }

    fn remove_entries(&self) -> Result<(), CacheError> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION) {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn read_entry(&self, namespace: &str, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        let path = self.entry_path(namespace, key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: StoredEntry = serde_json::from_str(&content)
            .map_err(|e| CacheError::Malformed(format!("{}: {e}", path.display())))?;
        Ok(Some(entry))
    }

    fn write_entry(&self, entry: &StoredEntry) -> Result<(), CacheError> {
        let path = self.entry_path(&entry.namespace, &entry.key);
        let content =
            serde_json::to_string(entry).map_err(|e| CacheError::Malformed(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl ResourceCache for FileCache {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        match self.read_entry(namespace, key) {
            Ok(Some(entry)) if entry.generation == *self.generation.read() => Some(entry.payload),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "cache read failed");
                None
            }
        }
    }

    fn set(&self, namespace: &str, key: &str, payload: &str) {
        let entry = StoredEntry {
            generation: self.generation.read().clone(),
            namespace: namespace.to_string(),
            key: key.to_string(),
            payload: payload.to_string(),
        };
        if let Err(e) = self.write_entry(&entry) {
            tracing::warn!(namespace, key, error = %e, "cache write failed");
        }
    }

    fn clear(&self, namespace: &str, key: &str) {
        let path = self.entry_path(namespace, key);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(namespace, key, error = %e, "cache clear failed");
            }
        }
    }
}
