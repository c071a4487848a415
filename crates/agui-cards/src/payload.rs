//! Helpers for loosely-typed tool results: a JSON value that may itself be a string
//! holding JSON.

use serde_json::{Map, Value};

/// Object view of a result: the object itself, or a string that decodes to an object.
pub fn object_of(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Display text of a result: strings verbatim, everything else as compact JSON.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Null or an empty string counts as "no result".
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub(crate) fn str_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn num_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

/// String argument from the tool-call args object, if present and non-empty.
pub fn arg(args: &Value, key: &str) -> Option<String> {
    args.as_object().and_then(|m| str_field(m, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_from_string_or_object() {
        assert!(object_of(&json!({"a": 1})).is_some());
        assert!(object_of(&json!(r#"{"a": 1}"#)).is_some());
        assert!(object_of(&json!("[1,2]")).is_none());
        assert!(object_of(&json!("{broken")).is_none());
        assert!(object_of(&json!(3)).is_none());
    }

    #[test]
    fn text_of_non_strings_is_json() {
        assert_eq!(text_of(&json!("hi")), "hi");
        assert_eq!(text_of(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(text_of(&Value::Null), "");
    }
}
