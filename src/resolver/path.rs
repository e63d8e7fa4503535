//! Path templates for classes and typed resources.

use std::fmt;
use std::str::FromStr;

use crate::error::LoadError;

/// Namespace that maps to the custom source root.
pub const CUSTOM_NAMESPACE: &str = "custom";

const CLIENT_ROOT: &str = "client";

/// Source root for an optional namespace prefix.
fn namespace_root(namespace: Option<&str>) -> String {
    match namespace {
        None => CLIENT_ROOT.to_string(),
        Some(CUSTOM_NAMESPACE) => format!("{CLIENT_ROOT}/custom"),
        Some(module) => format!("{CLIENT_ROOT}/modules/{module}"),
    }
}

fn split_namespace(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((namespace, rest)) => (Some(namespace), rest),
        None => (None, name),
    }
}

/// Path of a class script, e.g. `crm:views/meeting` → `client/modules/crm/src/views/meeting.js`.
pub fn class_path(name: &str) -> String {
    let (namespace, class) = split_namespace(name);
    format!("{}/src/{}.js", namespace_root(namespace), class)
}

/// Typed resources served from a `res/` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Template,
    LayoutTemplate,
    Layout,
}

impl ResourceKind {
    fn inner_path(self, name: &str) -> String {
        match self {
            Self::Template => {
                if name.contains('.') {
                    tracing::warn!(
                        name,
                        "template name should use slashes for a directory separator"
                    );
                }
                format!("res/templates/{}.tpl", name.replace('.', "/"))
            }
            Self::LayoutTemplate => format!("res/layout-types/{name}.tpl"),
            Self::Layout => format!("res/layouts/{name}.json"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "template" => Ok(Self::Template),
            "layoutTemplate" => Ok(Self::LayoutTemplate),
            "layout" => Ok(Self::Layout),
            other => Err(LoadError::Resolution(format!("unknown resource type '{other}'"))),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Template => "template",
            Self::LayoutTemplate => "layoutTemplate",
            Self::Layout => "layout",
        };
        f.write_str(label)
    }
}

/// Path of a typed resource, namespace-aware.
pub fn resource_path(kind: ResourceKind, name: &str) -> String {
    let (namespace, resource) = split_namespace(name);
    format!("{}/{}", namespace_root(namespace), kind.inner_path(resource))
}
