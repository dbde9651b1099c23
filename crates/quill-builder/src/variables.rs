//! Variable declarations and projection.
//!
//! The projection is deliberately permissive: declared variables without a
//! supplied value are skipped, and supplied values that were never declared
//! are dropped. Neither case is reported, so one declaration table can be
//! shared by calls that only populate part of it. A misspelt variable name
//! therefore surfaces as a server-side error, not a builder error.

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

/// Declared variables: name (with or without the `$` prefix) to type, e.g. `"id" => "Int!"`.
pub type VariableDefinitions = IndexMap<String, String>;

/// Runtime variable values keyed by name without the `$` prefix.
pub type Variables = Map<String, JsonValue>;

/// Returns `name` with exactly one leading `$`.
pub fn declared_name(name: &str) -> String {
    if name.starts_with('$') {
        name.to_string()
    } else {
        format!("${name}")
    }
}

/// Returns `name` without its leading `$`, if any.
pub fn bare_name(name: &str) -> &str {
    name.strip_prefix('$').unwrap_or(name)
}

/// Keeps the supplied values whose names were declared.
///
/// Presence is what counts: a supplied `null` or `0` is projected like any
/// other value. Output order follows the declarations.
///
/// Nothing is validated. Supplied names that were never declared are
/// dropped without error, so a misspelled variable silently disappears
/// from the request.
pub fn project_variables(declared: &VariableDefinitions, supplied: &Variables) -> Variables {
    declared
        .keys()
        .map(|name| bare_name(name))
        .filter_map(|name| {
            supplied
                .get(name)
                .map(|value| (name.to_string(), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn declared(names: &[(&str, &str)]) -> VariableDefinitions {
        names
            .iter()
            .map(|(name, ty)| (name.to_string(), ty.to_string()))
            .collect()
    }

    fn supplied(value: JsonValue) -> Variables {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_declared_name() {
        assert_eq!(declared_name("id"), "$id");
        assert_eq!(declared_name("$id"), "$id");
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(bare_name("$id"), "id");
        assert_eq!(bare_name("id"), "id");
        assert_eq!(bare_name("$$id"), "$id");
    }

    #[test]
    fn test_project_strips_prefix() {
        let projected = project_variables(
            &declared(&[("$id", "Int!"), ("email", "String!")]),
            &supplied(json!({"id": 1, "email": "a@b.c"})),
        );
        assert_eq!(JsonValue::Object(projected), json!({"id": 1, "email": "a@b.c"}));
    }

    #[test]
    fn test_project_keeps_null_and_zero() {
        let projected = project_variables(
            &declared(&[("a", "Int"), ("b", "String"), ("c", "Boolean")]),
            &supplied(json!({"a": 0, "b": null, "c": false})),
        );
        assert_eq!(projected.len(), 3);
        assert_eq!(projected["a"], json!(0));
        assert_eq!(projected["b"], JsonValue::Null);
        assert_eq!(projected["c"], json!(false));
    }

    #[test]
    fn test_project_omits_missing_and_undeclared() {
        let projected = project_variables(
            &declared(&[("id", "Int!"), ("name", "String")]),
            &supplied(json!({"name": "Zach", "extra": true})),
        );
        assert_eq!(JsonValue::Object(projected), json!({"name": "Zach"}));
    }

    #[test]
    fn test_project_is_subset_of_declarations() {
        let defs = declared(&[("$x", "Int"), ("y", "Int"), ("z", "Int")]);
        let values = supplied(json!({"x": 1, "z": [1, 2], "w": 4}));
        let projected = project_variables(&defs, &values);

        for (key, value) in &projected {
            assert!(defs.keys().any(|name| bare_name(name) == key));
            assert_eq!(Some(value), values.get(key));
        }
        assert_eq!(projected.len(), 2);
    }

    #[test]
    fn test_project_follows_declaration_order() {
        let projected = project_variables(
            &declared(&[("b", "Int"), ("a", "Int")]),
            &supplied(json!({"a": 1, "b": 2})),
        );
        let keys: Vec<_> = projected.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
