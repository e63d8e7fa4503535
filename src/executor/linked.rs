//! Script host backed by statically linked factories.
//!
//! Module scripts are JSON: a single statement or an array of statements.
//!
//! ```json
//! [
//!   {"op": "define", "deps": ["views/base"], "factory": "views/list"},
//!   {"op": "export", "to": "window", "as": "moment", "factory": "moment"}
//! ]
//! ```
//!
//! `define` may carry an explicit `name`; `export` publishes the factory's
//! value into the global scope, as a third-party library would.

use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::{EvalScope, Factory, ScriptError, ScriptHost};
use crate::libs::{GlobalScope, ROOT_SCOPE};
use crate::registry::Export;

fn root_scope() -> String {
    ROOT_SCOPE.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Statement {
    Define {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        deps: Vec<String>,
        factory: String,
    },
    Export {
        #[serde(default = "root_scope")]
        to: String,
        #[serde(rename = "as")]
        exports_as: String,
        factory: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Script {
    Many(Vec<Statement>),
    One(Statement),
}

/// Factory key → factory.
pub struct LinkTable {
    factories: RwLock<HashMap<String, Factory>>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Link a factory under `key`, replacing any earlier one.
    pub fn link<F>(&self, key: impl Into<String>, factory: F)
    where
        F: Fn(&[Export]) -> Option<Export> + Send + Sync + 'static,
    {
        self.factories.write().insert(key.into(), Arc::new(factory));
    }

    pub fn get(&self, key: &str) -> Option<Factory> {
        self.factories.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }
}

impl Default for LinkTable {
    fn default() -> Self {
        Self::new()
    }
}

/// [`ScriptHost`] resolving script statements against a [`LinkTable`].
pub struct LinkedHost {
    table: Arc<LinkTable>,
}

impl LinkedHost {
    pub fn new(table: Arc<LinkTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<LinkTable> {
        &self.table
    }

    fn factory(&self, key: &str) -> Result<Factory, ScriptError> {
        self.table
            .get(key)
            .ok_or_else(|| ScriptError::UnknownFactory(key.to_string()))
    }
}

impl Default for LinkedHost {
    fn default() -> Self {
        Self::new(Arc::new(LinkTable::new()))
    }
}

impl ScriptHost for LinkedHost {
    fn evaluate(&self, source: &str, scope: &mut EvalScope<'_>) -> Result<(), ScriptError> {
        let script: Script =
            serde_json::from_str(source).map_err(|e| ScriptError::Malformed(e.to_string()))?;
        let statements = match script {
            Script::Many(statements) => statements,
            Script::One(statement) => vec![statement],
        };

        // Resolve every factory first so a broken script records nothing.
        let mut resolved = Vec::with_capacity(statements.len());
        for statement in statements {
            let key = match &statement {
                Statement::Define { factory, .. } | Statement::Export { factory, .. } => factory,
            };
            let factory = self.factory(key)?;
            resolved.push((statement, factory));
        }

        for (statement, factory) in resolved {
            match statement {
                Statement::Define { name, deps, .. } => {
                    scope.define(name.as_deref(), deps, factory);
                }
                Statement::Export { to, exports_as, .. } => {
                    let location = GlobalScope::location(&to, &exports_as);
                    let value = factory(&[]).ok_or_else(|| ScriptError::ExportFailed(location.clone()))?;
                    scope.set_global(location, value);
                }
            }
        }

        Ok(())
    }
}
