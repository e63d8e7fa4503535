//! Identifier normalization.

use regex::Regex;
use std::sync::LazyLock;

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("([a-z])([A-Z])").expect("camel boundary pattern is valid"));

/// Insert a hyphen at every lowercase→uppercase boundary, then lower-case.
///
/// `FooBarBaz` becomes `foo-bar-baz`.
pub fn camel_to_hyphen(value: &str) -> String {
    CAMEL_BOUNDARY.replace_all(value, "$1-$2").to_lowercase()
}

fn starts_uppercase(value: &str) -> bool {
    value.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn convert_class_part(value: &str) -> String {
    camel_to_hyphen(value).replace('.', "/")
}

/// Normalize a class identifier to the slash/hyphen form.
///
/// Identifiers whose class part starts with an uppercase letter are treated as
/// class paths (`Views.Record.Detail` → `views/record/detail`). The namespace
/// prefix and the class part are converted independently.
pub fn normalize_class_name(name: &str) -> String {
    if name.contains('.') && !name.contains('!') {
        tracing::warn!(
            name,
            "class name should use slashes for a directory separator and hyphen format"
        );
    }

    match name.split_once(':') {
        Some((module, class)) => {
            if !starts_uppercase(name) && !starts_uppercase(class) {
                return name.to_string();
            }
            format!("{}:{}", camel_to_hyphen(module), convert_class_part(class))
        }
        None if starts_uppercase(name) => convert_class_part(name),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_to_hyphen() {
        assert_eq!(camel_to_hyphen("FooBarBaz"), "foo-bar-baz");
        assert_eq!(camel_to_hyphen("already-hyphen"), "already-hyphen");
        assert_eq!(camel_to_hyphen("ABC"), "abc");
    }

    #[test]
    fn test_lowercase_names_are_untouched() {
        assert_eq!(normalize_class_name("views/record/detail"), "views/record/detail");
        assert_eq!(normalize_class_name("crm:views/meeting"), "crm:views/meeting");
    }

    #[test]
    fn test_dotted_class_path() {
        assert_eq!(normalize_class_name("Views.Record.Detail"), "views/record/detail");
        assert_eq!(normalize_class_name("Crm:Views.Meeting.Detail"), "crm:views/meeting/detail");
    }

    #[test]
    fn test_uppercase_class_part_after_namespace() {
        assert_eq!(normalize_class_name("custom:Foo"), "custom:foo");
        assert_eq!(normalize_class_name("crm:Foo/BarBaz"), "crm:foo/bar-baz");
    }
}
