//! JSON interchange codec.
//!
//! Converts between [`Value`] and `serde_json::Value`. JSON has no set or
//! map-with-arbitrary-keys representation: sets serialize as arrays, and
//! maps serialize as objects when every key is a string (anything else is
//! an error). Parsing never produces a set or a map.

use serde_json::Value as JsonValue;

use crate::error::ValueError;
use crate::number::Number;
use crate::value::{Value, ValueObject};

/// Build a [`Value`] from parsed JSON. Object entry order is preserved.
pub fn from_json(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u as f64)
            } else {
                Value::from(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::from(s.as_str()),
        JsonValue::Array(items) => Value::array(items.iter().map(from_json).collect()),
        JsonValue::Object(entries) => {
            let map: ValueObject = entries
                .iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect();
            Value::object(map)
        }
    }
}

/// Render a [`Value`] as JSON.
///
/// Non-finite floats become `null` (JSON has no representation for them);
/// sets become arrays; maps become objects and fail with
/// [`ValueError::NonStringKey`] if any key is not a string.
pub fn to_json(value: &Value) -> Result<JsonValue, ValueError> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        Value::Number(Number::Int(i)) => Ok(JsonValue::from(*i)),
        Value::Number(Number::Float(f)) => Ok(serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)),
        Value::String(s) => Ok(JsonValue::String(s.to_string())),
        Value::Array(items) => items.iter().map(to_json).collect::<Result<Vec<_>, _>>().map(JsonValue::Array),
        Value::Set(items) => items.iter().map(to_json).collect::<Result<Vec<_>, _>>().map(JsonValue::Array),
        Value::Object(entries) => {
            let mut out = serde_json::Map::with_capacity(entries.len());
            for (k, v) in entries.iter() {
                out.insert(k.clone(), to_json(v)?);
            }
            Ok(JsonValue::Object(out))
        }
        Value::Map(entries) => {
            let mut out = serde_json::Map::with_capacity(entries.len());
            for (k, v) in entries.iter() {
                let key = k.as_str().ok_or(ValueError::NonStringKey)?;
                out.insert(key.to_string(), to_json(v)?);
            }
            Ok(JsonValue::Object(out))
        }
    }
}
