//! Executor/registrar: turns fetched script content into registrations.
//!
//! Fetched text is never evaluated dynamically. A [`ScriptHost`] interprets
//! it and makes explicit `define` calls against an [`EvalScope`], which
//! carries the subject currently being loaded. The loader then links each
//! recorded [`Definition`] against its dependencies and registers the result.

mod linked;

pub use linked::{LinkTable, LinkedHost};

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::libs::GlobalScope;
use crate::registry::Export;
use crate::resolver::normalize_class_name;

/// Builds a module value from its resolved dependencies, in declaration order.
/// Returning `None` means the module failed to produce a value.
pub type Factory = Arc<dyn Fn(&[Export]) -> Option<Export> + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Malformed script: {0}")]
    Malformed(String),

    #[error("Factory not linked: {0}")]
    UnknownFactory(String),

    #[error("Export to '{0}' produced no value")]
    ExportFailed(String),
}

/// A `define` call recorded during evaluation.
pub struct Definition {
    /// Registered name. `None` only for an anonymous define outside a load.
    pub subject: Option<String>,
    pub deps: Vec<String>,
    pub factory: Factory,
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("subject", &self.subject)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

/// State visible to a script while it is evaluated.
pub struct EvalScope<'a> {
    loading: Option<String>,
    globals: &'a GlobalScope,
    definitions: Vec<Definition>,
}

impl<'a> EvalScope<'a> {
    pub fn new(loading: Option<String>, globals: &'a GlobalScope) -> Self {
        Self {
            loading,
            globals,
            definitions: Vec::new(),
        }
    }

    /// Subject the loader expects this script to define, until the first
    /// `define` consumes it.
    pub fn loading_subject(&self) -> Option<&str> {
        self.loading.as_deref()
    }

    /// Record a definition. The first call consumes the loading subject; an
    /// anonymous define takes its name.
    pub fn define(&mut self, subject: Option<&str>, deps: Vec<String>, factory: Factory) {
        let slot = self.loading.take();
        let subject = subject.map(normalize_class_name).or(slot);
        self.definitions.push(Definition {
            subject,
            deps,
            factory,
        });
    }

    pub fn set_global(&mut self, location: impl Into<String>, value: Export) {
        self.globals.set_at(location, value);
    }

    pub fn global(&self, location: &str) -> Option<Export> {
        self.globals.get_at(location)
    }

    pub fn into_definitions(self) -> Vec<Definition> {
        self.definitions
    }
}

/// Interprets fetched script content.
///
/// Evaluation is synchronous; all registration happens through the scope.
pub trait ScriptHost: Send + Sync {
    fn evaluate(&self, source: &str, scope: &mut EvalScope<'_>) -> Result<(), ScriptError>;
}
