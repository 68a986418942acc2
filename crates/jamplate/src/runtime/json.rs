//! Arrays and objects travel through the machine as JSON text.
use serde_json::{Map, Value as Json};

use super::Value;

/// Reads a value's text as JSON. Text that is not valid JSON is a string.
pub fn decode(text: &str) -> Json {
    match serde_json::from_str(text) {
        Ok(json) => json,
        Err(_) => Json::String(text.to_string()),
    }
}

/// Strings become their raw content; everything else becomes its JSON text.
pub fn encode(json: &Json) -> Value {
    match json {
        Json::String(text) => Value::new(text.as_str()),
        json => Value::new(json.to_string()),
    }
}

pub fn decode_object(text: &str) -> Option<Map<String, Json>> {
    match decode(text) {
        Json::Object(object) => Some(object),
        _ => None,
    }
}

pub fn decode_array(text: &str) -> Option<Vec<Json>> {
    match decode(text) {
        Json::Array(array) => Some(array),
        _ => None,
    }
}
