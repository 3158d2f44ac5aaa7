//! JSON Schema fragments for tool parameters.
//!
//! Lenient parameters advertise their string forms with `anyOf` so that
//! schema-validating clients accept what the deserializers accept.

use serde_json::{Value, json};

/// RFC 3339 timestamp with offset.
#[must_use]
pub fn timestamp(description: &str) -> Value {
    json!({
        "type": "string",
        "format": "date-time",
        "description": format!("{description} RFC 3339 with time zone, e.g. 2024-05-01T08:00:00-04:00.")
    })
}

#[must_use]
pub fn boolean(description: &str) -> Value {
    json!({
        "anyOf": [
            {"type": "boolean"},
            {"type": "string", "enum": ["true", "false", "1", "0"]}
        ],
        "description": description
    })
}

#[must_use]
pub fn number(description: &str) -> Value {
    json!({
        "anyOf": [
            {"type": "number"},
            {"type": "string", "pattern": r"^\s*-?\d+(\.\d+)?\s*$"}
        ],
        "description": description
    })
}

#[must_use]
pub fn integer(description: &str, default: Option<u64>) -> Value {
    let mut schema = json!({
        "anyOf": [
            {"type": "integer", "minimum": 0},
            {"type": "string", "pattern": r"^\s*\d+\s*$"}
        ],
        "description": description
    });
    if let Some(default) = default {
        schema["default"] = json!(default);
    }
    schema
}

/// Array of `item_type`, or the same array JSON-encoded as a string.
#[must_use]
pub fn list(item_type: &str, description: &str) -> Value {
    json!({
        "anyOf": [
            {"type": "array", "items": {"type": item_type}},
            {"type": "string", "description": "JSON-encoded array"}
        ],
        "description": description
    })
}
