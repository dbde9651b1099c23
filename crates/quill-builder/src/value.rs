//! Argument values.
//!
//! A [`Value`] is the source-level literal bound to an argument: it is
//! rendered inline into the document text rather than sent as a variable.
//! [`Value::Raw`] is the escape hatch for text that must appear unquoted,
//! such as a `$variable` reference or an enum token like `asc`.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Number, Value as JsonValue};

/// Ordered argument map. Arguments render in insertion order.
pub type Arguments = IndexMap<String, Value>;

/// Key that marks a raw token in the JSON form of a value.
pub const RAW_KEY: &str = "$raw";

/// A literal argument value.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "JsonValue")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
    /// Emitted verbatim, never quoted.
    Raw(String),
}

impl Value {
    /// A token emitted exactly as given, e.g. `asc` or `users_pkey`.
    pub fn raw(token: impl Into<String>) -> Self {
        Self::Raw(token.into())
    }

    /// A reference to an operation variable. The `$` prefix is added when missing.
    ///
    /// ```
    /// use quill_builder::{encode_value, Value};
    ///
    /// assert_eq!(encode_value(&Value::variable("id")), "$id");
    /// assert_eq!(encode_value(&Value::variable("$id")), "$id");
    /// ```
    pub fn variable(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        if name.starts_with('$') {
            Self::Raw(name.to_string())
        } else {
            Self::Raw(format!("${name}"))
        }
    }

    /// A list of raw tokens, e.g. the columns of a `distinct_on`.
    pub fn raw_list<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(tokens.into_iter().map(Self::raw).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Reads a JSON value, honouring `{"$raw": ...}` markers.
    ///
    /// Everything under a marker is read in reference context, so every string
    /// it contains becomes a raw token: `{"$raw": ["id", "name"]}` renders as
    /// `[id, name]`.
    pub fn from_json(json: JsonValue) -> Self {
        Self::read_json(json, false)
    }

    fn read_json(json: JsonValue, raw: bool) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => Self::Number(n),
            JsonValue::String(s) if raw => Self::Raw(s),
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(|item| Self::read_json(item, raw))
                    .collect(),
            ),
            JsonValue::Object(mut map) => {
                if map.len() == 1 {
                    if let Some(inner) = map.remove(RAW_KEY) {
                        return Self::read_json(inner, true);
                    }
                }
                Self::Object(
                    map.into_iter()
                        .map(|(key, value)| (key, Self::read_json(value, raw)))
                        .collect(),
                )
            }
        }
    }

    /// Converts to plain JSON for use as a runtime variable value.
    ///
    /// Raw tokens become plain strings: a variable payload has no notion of
    /// unquoted text.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Number(n) => JsonValue::Number(n.clone()),
            Self::String(s) | Self::Raw(s) => JsonValue::String(s.clone()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Self::from_json(json)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite floats have no literal form and become `null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::from(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::Object(map)
    }
}

/// Builds an [`Arguments`] map (or a nested object value) in the order written.
///
/// ```
/// use quill_builder::{args, encode_arguments, Value};
///
/// let args = args! {
///     "where" => args! { "id" => args! { "_eq" => Value::variable("id") } },
///     "limit" => 10,
/// };
/// assert_eq!(encode_arguments(&args), "where: {id: {_eq: $id}}, limit: 10");
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Arguments::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Arguments::new();
        $(
            map.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_variable_adds_prefix_once() {
        assert_eq!(Value::variable("id"), Value::Raw("$id".into()));
        assert_eq!(Value::variable("$id"), Value::Raw("$id".into()));
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
        assert_eq!(Value::from(f64::INFINITY), Value::Null);
        assert!(matches!(Value::from(1.5), Value::Number(_)));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".into()));
    }

    #[test]
    fn test_from_json_plain() {
        let value = Value::from_json(json!({"name": "Zach", "tags": ["a", 1, null]}));
        let expected = Value::Object(args! {
            "name" => "Zach",
            "tags" => Value::List(vec![Value::from("a"), Value::from(1), Value::Null]),
        });
        assert_eq!(value, expected);
    }

    #[test]
    fn test_from_json_raw_marker() {
        let value = Value::from_json(json!({"order_by": {"id": {"$raw": "asc"}}}));
        assert_eq!(
            value,
            Value::Object(args! { "order_by" => args! { "id" => Value::raw("asc") } })
        );
    }

    #[test]
    fn test_from_json_raw_context_propagates() {
        let value = Value::from_json(json!({"$raw": ["id", {"col": "name"}, 3]}));
        assert_eq!(
            value,
            Value::List(vec![
                Value::raw("id"),
                Value::Object(args! { "col" => Value::raw("name") }),
                Value::from(3),
            ])
        );
    }

    #[test]
    fn test_raw_key_with_siblings_is_plain_object() {
        let value = Value::from_json(json!({"$raw": "x", "other": 1}));
        assert!(matches!(value, Value::Object(ref map) if map.len() == 2));
    }

    #[test]
    fn test_to_json_flattens_raw_tokens() {
        let value = Value::Object(args! {
            "status" => Value::raw("active"),
            "score" => 2,
        });
        assert_eq!(value.to_json(), json!({"status": "active", "score": 2}));
    }

    #[test]
    fn test_deserialize_through_json() {
        let value: Value = serde_json::from_str(r#"{"id": {"$raw": "$id"}}"#).unwrap();
        assert_eq!(value, Value::Object(args! { "id" => Value::variable("id") }));
    }

    #[test]
    fn test_args_macro_keeps_order() {
        let args = args! { "b" => 1, "a" => 2, "c" => 3 };
        let keys: Vec<_> = args.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
