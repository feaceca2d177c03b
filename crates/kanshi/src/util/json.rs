//! Lenient accessors for loosely shaped platform payloads.

use serde_json::Value;

/// String at a JSON pointer, empty when absent or not a string.
pub fn str_at<'v>(value: &'v Value, pointer: &str) -> &'v str {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Text form of a string or number at a JSON pointer, empty otherwise.
pub fn text_at(value: &Value, pointer: &str) -> String {
    match value.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
