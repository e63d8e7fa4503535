//! Third-party library configuration and the global scope libraries export into.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::registry::Export;

/// Export location meaning "the root of the global scope".
pub const ROOT_SCOPE: &str = "window";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read libs config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid libs config: {0}")]
    Invalid(String),
}

/// Per-library settings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibEntry {
    /// Fetch path; defaults to the library name.
    pub path: Option<String>,
    /// Dotted location the library exports into; defaults to `window`.
    pub exports_to: Option<String>,
    /// Name under `exports_to`; defaults to the library name.
    pub exports_as: Option<String>,
}

/// Resolved fetch path and export location of one library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibTarget {
    pub path: String,
    pub exports_to: String,
    pub exports_as: String,
}

/// Library name → settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibsConfig {
    entries: HashMap<String, LibEntry>,
}

impl LibsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Load from a `.toml` or JSON file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: LibEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&LibEntry> {
        self.entries.get(name)
    }

    /// Merge another config in. Entries are replaced whole per library.
    pub fn merge(&mut self, other: LibsConfig) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch path and export location for `name`, falling back to defaults.
    pub fn target(&self, name: &str) -> LibTarget {
        let entry = self.entries.get(name);
        let pick = |value: Option<&String>, default: &str| {
            value.cloned().unwrap_or_else(|| default.to_string())
        };
        LibTarget {
            path: pick(entry.and_then(|e| e.path.as_ref()), name),
            exports_to: pick(entry.and_then(|e| e.exports_to.as_ref()), ROOT_SCOPE),
            exports_as: pick(entry.and_then(|e| e.exports_as.as_ref()), name),
        }
    }
}

/// Values published by libraries, keyed by dotted location.
pub struct GlobalScope {
    values: DashMap<String, Export>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    /// Flatten an (`exports_to`, `exports_as`) pair into a scope key.
    pub fn location(exports_to: &str, exports_as: &str) -> String {
        if exports_to == ROOT_SCOPE || exports_to.is_empty() {
            exports_as.to_string()
        } else {
            let to = exports_to.strip_prefix("window.").unwrap_or(exports_to);
            format!("{to}.{exports_as}")
        }
    }

    pub fn get(&self, exports_to: &str, exports_as: &str) -> Option<Export> {
        self.get_at(&Self::location(exports_to, exports_as))
    }

    pub fn get_at(&self, location: &str) -> Option<Export> {
        self.values.get(location).map(|v| v.clone())
    }

    pub fn set_at(&self, location: impl Into<String>, value: Export) {
        self.values.insert(location.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for GlobalScope {
    fn default() -> Self {
        Self::new()
    }
}
