//! Inline literal encoding of argument values.

use serde_json::Number;

use crate::value::{Arguments, Value};

/// Beyond this magnitude integral floats keep their exponent form.
const MAX_PLAIN_FLOAT: f64 = 1e21;

/// Encodes a value as document-level literal text.
///
/// Strings are JSON-quoted, raw tokens are emitted verbatim, lists and
/// objects recurse with `", "` separators and object keys stay unquoted.
///
/// ```
/// use quill_builder::{args, encode_value, Value};
///
/// let value = Value::from(args! {
///     "name" => "Zach",
///     "order" => Value::raw("asc"),
///     "ids" => vec![1, 2],
/// });
/// assert_eq!(encode_value(&value), r#"{name: "Zach", order: asc, ids: [1, 2]}"#);
/// ```
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => encode_number(n),
        Value::String(s) => quote(s),
        Value::Raw(token) => token.clone(),
        Value::List(items) => {
            let items = items.iter().map(encode_value).collect::<Vec<_>>();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => format!("{{{}}}", encode_arguments(map)),
    }
}

/// Encodes `key: value` pairs in map order, separated by `", "`.
///
/// An empty map encodes to an empty string; callers decide whether to emit
/// the surrounding parentheses.
pub fn encode_arguments(args: &Arguments) -> String {
    args.iter()
        .map(|(key, value)| format!("{}: {}", key, encode_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Integral floats print without a fractional part, so `10.0` encodes
/// as `10` and stays a valid `Int` literal.
fn encode_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_PLAIN_FLOAT => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{f:.0}")
            }
        }
        _ => n.to_string(),
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}
