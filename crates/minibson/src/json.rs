//! JSON serialization and deserialization for documents.
//!
//! This module converts between JSON text and owned [`Document`] trees.
//!
//! # Example
//!
//! ```
//! use minibson::json::{from_json, to_json};
//!
//! let doc = from_json(r#"{"name": "alice", "age": 30}"#).unwrap();
//! assert_eq!(doc.get::<i32>("age").unwrap(), &30);
//!
//! let json = to_json(&doc).unwrap();
//! assert_eq!(json, r#"{"age":30,"name":"alice"}"#);
//! ```
//!
//! # Mapping
//!
//! | Element    | JSON                                      |
//! |------------|-------------------------------------------|
//! | `null`     | null                                      |
//! | `boolean`  | true/false                                |
//! | `int32`    | integer (fits i32)                        |
//! | `int64`    | other integer (fits i64)                  |
//! | `double`   | other number                              |
//! | `binary`   | string with `b64:` prefix (valid base64)  |
//! | `string`   | other string                              |
//! | `array`    | array                                     |
//! | `document` | object                                    |
//!
//! The top-level JSON value must be an object. Binary subtypes are not
//! represented in JSON; decoded binaries use the generic subtype.

use base64::Engine;
use serde_json::Value as JsonValue;

use crate::array::Array;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::value::{Binary, Value};

const BINARY_PREFIX: &str = "b64:";

/// Parse a JSON object into a document.
///
/// # Errors
///
/// Returns `Error::Json` if the text is not valid JSON or its top-level
/// value is not an object.
pub fn from_json(json: &str) -> Result<Document> {
    let json_value: JsonValue = serde_json::from_str(json).map_err(|e| Error::Json(e.to_string()))?;
    from_json_value(&json_value)
}

/// Convert a parsed JSON object into a document.
///
/// # Errors
///
/// Returns `Error::Json` if `json` is not an object.
pub fn from_json_value(json: &JsonValue) -> Result<Document> {
    match json {
        JsonValue::Object(obj) => Ok(object_to_document(obj)),
        other => Err(Error::Json(format!(
            "top-level value must be an object, found {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn object_to_document(obj: &serde_json::Map<String, JsonValue>) -> Document {
    obj.iter()
        .map(|(k, v)| (k.as_str(), json_to_value(v)))
        .collect()
}

fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,

        JsonValue::Bool(b) => Value::Boolean(*b),

        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_or(Value::Int64(i), Value::Int32)
            } else {
                // u64 beyond i64 and all fractional numbers
                Value::Double(n.as_f64().unwrap_or(0.0))
            }
        }

        JsonValue::String(s) => {
            if let Some(payload) = s.strip_prefix(BINARY_PREFIX)
                && let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(payload)
            {
                return Value::Binary(Binary::new(bytes));
            }
            Value::String(s.clone())
        }

        JsonValue::Array(items) => Value::Array(items.iter().map(json_to_value).collect::<Array>()),

        JsonValue::Object(obj) => Value::Document(object_to_document(obj)),
    }
}

/// Convert a document to a JSON string. Keys appear in sorted order.
///
/// # Errors
///
/// Returns `Error::Json` if a double is NaN or infinite.
pub fn to_json(doc: &Document) -> Result<String> {
    let json_value = to_json_value(doc)?;
    serde_json::to_string(&json_value).map_err(|e| Error::Json(e.to_string()))
}

/// Convert a document to a `serde_json::Value` object.
///
/// # Errors
///
/// Returns `Error::Json` if a double is NaN or infinite.
pub fn to_json_value(doc: &Document) -> Result<JsonValue> {
    let mut obj = serde_json::Map::new();
    for (key, value) in doc {
        obj.insert(key.clone(), value_to_json(value)?);
    }
    Ok(JsonValue::Object(obj))
}

fn value_to_json(value: &Value) -> Result<JsonValue> {
    match value {
        Value::Null => Ok(JsonValue::Null),

        Value::Boolean(b) => Ok(JsonValue::Bool(*b)),

        Value::Int32(n) => Ok(JsonValue::Number((*n).into())),

        Value::Int64(n) => Ok(JsonValue::Number((*n).into())),

        Value::Double(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| Error::Json(format!("non-finite double {f} has no JSON form"))),

        Value::String(s) => Ok(JsonValue::String(s.clone())),

        Value::Binary(b) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&b.bytes);
            Ok(JsonValue::String(format!("{BINARY_PREFIX}{encoded}")))
        }

        Value::Array(arr) => arr
            .iter()
            .map(value_to_json)
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),

        Value::Document(doc) => to_json_value(doc),
    }
}
