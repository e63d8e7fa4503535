//! Load requests and `require` subjects.

use super::flight::FlightKey;
use crate::libs::LibsConfig;
use crate::resolver::{class_path, Identifier};

/// What a `require` call asks for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Subject {
    /// Nothing; the continuation runs immediately with no values.
    #[default]
    None,
    One(String),
    /// A join; values come back in list order.
    Many(Vec<String>),
}

impl From<&str> for Subject {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for Subject {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for Subject {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

impl From<Vec<&str>> for Subject {
    fn from(names: Vec<&str>) -> Self {
        Self::Many(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Subject {
    fn from(names: [&str; N]) -> Self {
        Self::Many(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<T: Into<Subject>> From<Option<T>> for Subject {
    fn from(subject: Option<T>) -> Self {
        subject.map_or(Self::None, Into::into)
    }
}

impl Subject {
    /// Names in request order.
    pub fn into_names(self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::One(name) => vec![name],
            Self::Many(names) => names,
        }
    }
}

/// One resolved load.
#[derive(Debug, Clone)]
pub(crate) struct LoadRequest {
    pub id: Identifier,
    /// Memo key: class name, or the full `res!`/`lib!` identifier.
    pub key: String,
    /// Fetch path before cache busting.
    pub path: String,
    /// Excluded from persistent cache writes.
    pub no_app_cache: bool,
    /// Export location (`exports_to`, `exports_as`) for libraries.
    pub exports: Option<(String, String)>,
}

impl LoadRequest {
    pub fn new(id: Identifier, libs: &LibsConfig) -> Self {
        let key = id.key();
        match &id {
            Identifier::Class { name } => Self {
                path: class_path(name),
                id: id.clone(),
                key,
                no_app_cache: false,
                exports: None,
            },
            Identifier::Resource { path } => Self {
                path: path.clone(),
                id: id.clone(),
                key,
                no_app_cache: false,
                exports: None,
            },
            Identifier::Library { name } => {
                let target = libs.target(name);
                Self {
                    path: target.path,
                    id: id.clone(),
                    key,
                    no_app_cache: true,
                    exports: Some((target.exports_to, target.exports_as)),
                }
            }
        }
    }

    /// Single-flight identity: the same path loaded as another subject is a
    /// separate flight.
    pub fn flight_key(&self) -> FlightKey {
        FlightKey::new(self.path.clone(), self.key.clone())
    }
}
