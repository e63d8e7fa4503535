//! In-memory transport with fetch accounting.
//!
//! Documents are keyed by URL without its query string. A path can be held
//! with a [`FetchGate`] so that its fetch stays outstanding until released.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Notify;

use super::{strip_query, Transport, TransportError};

/// Holds one fetch of a path until [`FetchGate::release`] is called.
#[derive(Clone)]
pub struct FetchGate {
    notify: Arc<Notify>,
}

impl FetchGate {
    /// Let the held fetch complete. Releasing before the fetch starts lets it
    /// pass straight through.
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

/// Serves documents from memory.
pub struct MemoryTransport {
    documents: DashMap<String, String>,
    failing: DashMap<String, String>,
    fetches: DashMap<String, usize>,
    gates: DashMap<String, FetchGate>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            failing: DashMap::new(),
            fetches: DashMap::new(),
            gates: DashMap::new(),
        }
    }

    /// Serve `body` at `path`.
    pub fn insert(&self, path: impl Into<String>, body: impl Into<String>) {
        self.documents.insert(path.into(), body.into());
    }

    /// Builder form of [`MemoryTransport::insert`].
    pub fn with(self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(path, body);
        self
    }

    /// Make every fetch of `path` fail with `reason`.
    pub fn fail(&self, path: impl Into<String>, reason: impl Into<String>) {
        self.failing.insert(path.into(), reason.into());
    }

    /// Stop failing `path`.
    pub fn recover(&self, path: &str) {
        self.failing.remove(path);
    }

    /// Hold the next fetch of `path` until the returned gate is released.
    pub fn hold(&self, path: impl Into<String>) -> FetchGate {
        let gate = FetchGate {
            notify: Arc::new(Notify::new()),
        };
        self.gates.insert(path.into(), gate.clone());
        gate
    }

    /// Number of fetches started for `path`.
    pub fn fetch_count(&self, path: &str) -> usize {
        self.fetches.get(path).map(|c| *c).unwrap_or(0)
    }

    /// Number of fetches started for any path.
    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|c| *c.value()).sum()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let path = strip_query(url).to_string();
        *self.fetches.entry(path.clone()).or_insert(0) += 1;

        let gate = self.gates.remove(&path).map(|(_, gate)| gate);
        if let Some(gate) = gate {
            gate.notify.notified().await;
        }

        if let Some(reason) = self.failing.get(&path) {
            return Err(TransportError::Unavailable(reason.clone()));
        }

        self.documents
            .get(&path)
            .map(|body| body.clone())
            .ok_or(TransportError::NotFound(path))
    }
}
