//! Registry of loaded values.
//!
//! Used twice by the loader: once as the class registry (keyed by class name,
//! filled by `define`) and once as the loaded-data table (keyed by the full
//! `res!`/`lib!` identifier). Entries are never evicted.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A value produced by a load.
#[derive(Clone)]
pub enum Export {
    /// Raw text of a resource.
    Text(Arc<str>),
    /// A registered class, library object or any other host value.
    Object(Arc<dyn Any + Send + Sync>),
}

impl Export {
    pub fn text(value: impl Into<Arc<str>>) -> Self {
        Self::Text(value.into())
    }

    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(Arc::new(value))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Object(_) => None,
        }
    }

    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            Self::Object(object) => object.downcast_ref::<T>(),
            Self::Text(_) => None,
        }
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Object(object) => object.clone().downcast::<T>().ok(),
            Self::Text(_) => None,
        }
    }

    /// True when both exports point at the same allocation.
    pub fn same(&self, other: &Export) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => {
                std::ptr::eq(Arc::as_ptr(a) as *const u8, Arc::as_ptr(b) as *const u8)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Thread-safe name → value table.
pub struct Registry {
    entries: RwLock<HashMap<String, Export>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<Export> {
        self.entries.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Register a value. A later registration under the same name replaces
    /// the earlier one.
    pub fn insert(&self, name: impl Into<String>, value: Export) {
        self.entries.write().insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
