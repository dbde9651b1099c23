//! Field selections.
//!
//! [`Fields`] is the recursive description of a selection set: nothing, a
//! bare name (or a pre-formatted run of names such as `"id name email"`), a
//! list of sibling selections, or a [`Field`] node with alias, arguments,
//! directives and its own nested selection.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::{
    error::{BuildError, Result},
    value::{Arguments, Value},
};

/// A selection specification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "JsonValue")]
pub enum Fields {
    /// Renders as empty text.
    Empty,
    /// Emitted verbatim.
    Name(String),
    /// Sibling selections, one per line.
    List(Vec<Fields>),
    Node(Box<Field>),
}

/// A named selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub args: Arguments,
    pub directives: Vec<Directive>,
    /// `None` renders the field as a leaf.
    pub fields: Option<Fields>,
}

/// A directive such as `@include(if: $withEmail)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub args: Arguments,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            args: Arguments::new(),
            directives: Vec::new(),
            fields: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Appends every entry of `args`, replacing values of keys already present.
    pub fn args(mut self, args: Arguments) -> Self {
        self.args.extend(args);
        self
    }

    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn fields(mut self, fields: impl Into<Fields>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}

impl Directive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Arguments::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// `@include(if: <condition>)`
    pub fn include(condition: impl Into<Value>) -> Self {
        Self::new("include").arg("if", condition)
    }

    /// `@skip(if: <condition>)`
    pub fn skip(condition: impl Into<Value>) -> Self {
        Self::new("skip").arg("if", condition)
    }
}

impl Fields {
    /// The selection used when an operation names no fields.
    pub fn sentinel() -> Self {
        Self::Name(crate::operation::SENTINEL_FIELD.to_string())
    }

    /// Reads the JSON form of a selection.
    ///
    /// `null`, strings, arrays and objects map onto [`Fields::Empty`],
    /// [`Fields::Name`], [`Fields::List`] and [`Fields::Node`]. Node objects
    /// accept the keys `name` (required), `alias`, `args`, `directives` and
    /// `fields`. Numbers and booleans are a malformed specification.
    pub fn from_json(json: JsonValue) -> Result<Self> {
        match json {
            JsonValue::Null => Ok(Self::Empty),
            JsonValue::String(name) => Ok(Self::Name(name)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            JsonValue::Object(mut map) => {
                let name = match map.remove("name") {
                    Some(JsonValue::String(name)) if !name.trim().is_empty() => name,
                    Some(JsonValue::String(_)) | None => {
                        return Err(BuildError::malformed("field node has no name"));
                    }
                    Some(other) => {
                        return Err(BuildError::malformed(format!(
                            "field name must be a string, found {}",
                            json_kind(&other)
                        )));
                    }
                };

                let alias = match map.remove("alias") {
                    None | Some(JsonValue::Null) => None,
                    Some(JsonValue::String(alias)) => Some(alias),
                    Some(other) => {
                        return Err(BuildError::malformed(format!(
                            "alias of `{name}` must be a string, found {}",
                            json_kind(&other)
                        )));
                    }
                };

                let args = read_arguments(map.remove("args"), &name)?;

                let directives = match map.remove("directives") {
                    None | Some(JsonValue::Null) => Vec::new(),
                    Some(JsonValue::Array(items)) => items
                        .into_iter()
                        .map(read_directive)
                        .collect::<Result<Vec<_>>>()?,
                    Some(other) => {
                        return Err(BuildError::malformed(format!(
                            "directives of `{name}` must be a list, found {}",
                            json_kind(&other)
                        )));
                    }
                };

                let fields = match map.remove("fields") {
                    None | Some(JsonValue::Null) => None,
                    Some(nested) => Some(Self::from_json(nested)?),
                };

                Ok(Self::Node(Box::new(Field {
                    alias,
                    name,
                    args,
                    directives,
                    fields,
                })))
            }
            other => Err(BuildError::malformed(format!(
                "expected a name, a list or a field object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn read_arguments(json: Option<JsonValue>, owner: &str) -> Result<Arguments> {
    match json {
        None | Some(JsonValue::Null) => Ok(Arguments::new()),
        Some(JsonValue::Object(map)) => Ok(map
            .into_iter()
            .map(|(key, value)| (key, Value::from_json(value)))
            .collect()),
        Some(other) => Err(BuildError::malformed(format!(
            "arguments of `{owner}` must be an object, found {}",
            json_kind(&other)
        ))),
    }
}

fn read_directive(json: JsonValue) -> Result<Directive> {
    let mut map = match json {
        JsonValue::Object(map) => map,
        other => {
            return Err(BuildError::malformed(format!(
                "directive must be an object, found {}",
                json_kind(&other)
            )));
        }
    };

    let name = match map.remove("name") {
        Some(JsonValue::String(name)) if !name.trim().is_empty() => name,
        _ => return Err(BuildError::malformed("directive has no name")),
    };
    let args = read_arguments(map.remove("args"), &format!("@{name}"))?;

    Ok(Directive {
        name,
        args,
    })
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "an object",
    }
}

impl TryFrom<JsonValue> for Fields {
    type Error = BuildError;

    fn try_from(json: JsonValue) -> Result<Self> {
        Self::from_json(json)
    }
}

impl From<&str> for Fields {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Fields {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Field> for Fields {
    fn from(field: Field) -> Self {
        Self::Node(Box::new(field))
    }
}

impl<T: Into<Fields>> From<Vec<T>> for Fields {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Fields>, const N: usize> From<[T; N]> for Fields {
    fn from(items: [T; N]) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::args;

    #[test]
    fn test_from_json_name_and_list() {
        let fields = Fields::from_json(json!(["id", "name email"])).unwrap();
        assert_eq!(fields, Fields::from(vec!["id", "name email"]));
    }

    #[test]
    fn test_from_json_node() {
        let fields = Fields::from_json(json!({
            "alias": "avatar_image",
            "name": "avatar",
            "args": {"size": 64},
            "directives": [{"name": "include", "args": {"if": {"$raw": "$withAvatar"}}}],
            "fields": ["id", "url"]
        }))
        .unwrap();

        let expected = Field::new("avatar")
            .alias("avatar_image")
            .arg("size", 64)
            .directive(Directive::include(Value::variable("withAvatar")))
            .fields(["id", "url"]);
        assert_eq!(fields, Fields::from(expected));
    }

    #[test]
    fn test_from_json_rejects_scalars() {
        for json in [json!(1), json!(2.5), json!(true)] {
            let err = Fields::from_json(json).unwrap_err();
            assert!(matches!(err, BuildError::MalformedFields { .. }));
        }
    }

    #[test]
    fn test_from_json_null_is_empty() {
        assert_eq!(Fields::from_json(json!(null)).unwrap(), Fields::Empty);

        let fields = Fields::from_json(json!(["id", null, "name"])).unwrap();
        assert_eq!(
            fields,
            Fields::List(vec![Fields::from("id"), Fields::Empty, Fields::from("name")])
        );
    }

    #[test]
    fn test_from_json_rejects_nested_scalar() {
        let err = Fields::from_json(json!(["id", {"name": "posts", "fields": [42]}])).unwrap_err();
        assert!(format!("{}", err).contains("found a number"));
    }

    #[test]
    fn test_from_json_requires_name() {
        let err = Fields::from_json(json!({"alias": "x"})).unwrap_err();
        assert!(format!("{}", err).contains("no name"));

        let err = Fields::from_json(json!({"name": ""})).unwrap_err();
        assert!(format!("{}", err).contains("no name"));

        let err = Fields::from_json(json!({"name": 3})).unwrap_err();
        assert!(format!("{}", err).contains("must be a string"));
    }

    #[test]
    fn test_from_json_rejects_bad_args_and_directives() {
        assert!(Fields::from_json(json!({"name": "users", "args": [1]})).is_err());
        assert!(Fields::from_json(json!({"name": "users", "directives": "skip"})).is_err());
        assert!(Fields::from_json(json!({"name": "users", "directives": [{"args": {}}]})).is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let fields: Fields = toml::from_str::<toml::Table>(
            r#"
            name = "users"
            fields = ["id", "name"]
            [args.where.id]
            _eq = { "$raw" = "$id" }
            "#,
        )
        .map(|table| serde_json::to_value(table).unwrap())
        .map(|json| Fields::from_json(json).unwrap())
        .unwrap();

        let expected = Field::new("users")
            .arg(
                "where",
                args! { "id" => args! { "_eq" => Value::variable("id") } },
            )
            .fields(["id", "name"]);
        assert_eq!(fields, Fields::from(expected));
    }
}
