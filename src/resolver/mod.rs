//! Name resolution for logical module and resource identifiers.
//!
//! Grammar: `[lib!|res!][<namespace>:]<segment>(/<segment>)*`. Bare
//! identifiers are classes and resolve to a script under the application,
//! module or custom source root.

mod name;
mod path;

pub use name::{camel_to_hyphen, normalize_class_name};
pub use path::{class_path, resource_path, ResourceKind, CUSTOM_NAMESPACE};

use crate::error::LoadError;

const LIB_TAG: &str = "lib!";
const RES_TAG: &str = "res!";

/// A parsed logical identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// A class registered through `define`, keyed by its normalized name.
    Class { name: String },
    /// A raw resource path (`res!client/res/templates/a.tpl`).
    Resource { path: String },
    /// A third-party library (`lib!moment`).
    Library { name: String },
}

impl Identifier {
    /// Parse a raw identifier. Class names are normalized.
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        if raw.is_empty() {
            return Err(LoadError::Resolution("can not load empty class name".into()));
        }

        if let Some(name) = raw.strip_prefix(LIB_TAG) {
            if name.is_empty() {
                return Err(LoadError::Resolution(format!("empty library name in '{raw}'")));
            }
            return Ok(Self::Library { name: name.to_string() });
        }

        if let Some(path) = raw.strip_prefix(RES_TAG) {
            if path.is_empty() {
                return Err(LoadError::Resolution(format!("empty resource path in '{raw}'")));
            }
            return Ok(Self::Resource { path: path.to_string() });
        }

        if let Some((tag, _)) = raw.split_once('!') {
            return Err(LoadError::Resolution(format!("unknown type tag '{tag}!' in '{raw}'")));
        }

        Ok(Self::Class { name: normalize_class_name(raw) })
    }

    /// Key under which the loaded value is memoized.
    ///
    /// Classes use their name, resources and libraries the full prefixed form.
    pub fn key(&self) -> String {
        match self {
            Self::Class { name } => name.clone(),
            Self::Resource { path } => format!("{RES_TAG}{path}"),
            Self::Library { name } => format!("{LIB_TAG}{name}"),
        }
    }

    /// Default fetch path, ignoring any libs configuration.
    pub fn default_path(&self) -> String {
        match self {
            Self::Class { name } => class_path(name),
            Self::Resource { path } => path.clone(),
            Self::Library { name } => name.clone(),
        }
    }
}

/// Resolve an identifier to its fetch path.
///
/// Libraries resolve to their bare name here; `Loader::resolve` consults the
/// libs configuration.
pub fn resolve(name: &str) -> Result<String, LoadError> {
    Identifier::parse(name).map(|id| id.default_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!(
            Identifier::parse("lib!moment").unwrap(),
            Identifier::Library { name: "moment".into() }
        );
        assert_eq!(
            Identifier::parse("res!client/res/templates/a.tpl").unwrap(),
            Identifier::Resource { path: "client/res/templates/a.tpl".into() }
        );
        assert_eq!(
            Identifier::parse("FooBar").unwrap(),
            Identifier::Class { name: "foo-bar".into() }
        );
    }

    #[test]
    fn test_parse_rejects_empty_and_unknown_tags() {
        assert!(matches!(Identifier::parse(""), Err(LoadError::Resolution(_))));
        assert!(matches!(Identifier::parse("lib!"), Err(LoadError::Resolution(_))));
        assert!(matches!(Identifier::parse("css!main"), Err(LoadError::Resolution(_))));
    }

    #[test]
    fn test_keys_keep_prefix() {
        assert_eq!(Identifier::parse("res!a.tpl").unwrap().key(), "res!a.tpl");
        assert_eq!(Identifier::parse("lib!jquery").unwrap().key(), "lib!jquery");
        assert_eq!(Identifier::parse("views/base").unwrap().key(), "views/base");
    }
}
