//! Loader counters recorded through the `metrics` facade.

use metrics::counter;

/// Where a payload came from when the transport was not involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Persistent,
    Response,
}

impl CacheSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Persistent => "cache",
            Self::Response => "response_cache",
        }
    }
}

/// One transport fetch started.
pub fn record_fetch() {
    counter!("loader_fetch_total").increment(1);
}

/// A payload served from a cache.
pub fn record_cache_hit(source: CacheSource) {
    counter!("loader_cache_hit_total", "source" => source.as_str()).increment(1);
}

/// A load failed; `kind` is `LoadError::kind`.
pub fn record_load_failure(kind: &'static str) {
    counter!("loader_load_failure_total", "kind" => kind).increment(1);
}
