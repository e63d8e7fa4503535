//! Load error types for the client loader.
//!
//! A single flight fans its result out to every waiter, so `LoadError` is
//! `Clone` and carries rendered messages instead of source errors.

use thiserror::Error;

/// Errors surfaced by `Loader::load`, `Loader::require` and `Loader::define`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Could not resolve identifier: {0}")]
    Resolution(String),

    #[error("Could not load file '{path}': {reason}")]
    Fetch { path: String, reason: String },

    #[error("Could not load '{name}'")]
    Registration { name: String },

    #[error("Script for '{name}' failed: {reason}")]
    Evaluation { name: String, reason: String },

    #[error("Library '{name}' did not export '{location}'")]
    ExportMissing { name: String, location: String },

    #[error("Circular dependency: {chain}")]
    Circular { chain: String },

    #[error("Load of '{path}' aborted")]
    Aborted { path: String },
}

impl LoadError {
    /// Fetch failures are the only errors a caller is expected to handle.
    ///
    /// Everything else means the module content is broken and the subject
    /// stays unusable for the rest of the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    /// Short label used for metrics and span fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "resolution",
            Self::Fetch { .. } => "fetch",
            Self::Registration { .. } => "registration",
            Self::Evaluation { .. } => "evaluation",
            Self::ExportMissing { .. } => "export_missing",
            Self::Circular { .. } => "circular",
            Self::Aborted { .. } => "aborted",
        }
    }
}
