//! Span utilities for module loads.

use tracing::{info_span, Span};

/// Extension trait for adding context to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for load spans.
pub struct LoadSpan;

impl LoadSpan {
    /// Span covering one flight of `path` on behalf of `name`.
    ///
    /// `source` is filled in once the payload arrives (`cache`,
    /// `response_cache` or `network`), `status`/`error.message` through
    /// [`SpanExt::record_result`].
    pub fn new(name: &str, path: &str) -> Span {
        info_span!(
            "module_load",
            name = %name,
            path = %path,
            source = tracing::field::Empty,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}
