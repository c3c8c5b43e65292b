//! Tag map expansion and flattening.
//!
//! Tags cross the configuration boundary as a JSON object with scalar
//! values and cross the API boundary as a plain string-to-string map.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};

/// Expands a configured tag attribute into the map the API consumes.
/// Scalar values are coerced to strings; nested values are rejected.
pub fn expand(value: &Value) -> Result<HashMap<String, String>> {
    let Some(map) = value.as_object() else {
        return Err(Error::invalid_attribute(
            "tags",
            "expected a map of string values",
        ));
    };

    let mut tags = HashMap::with_capacity(map.len());
    for (key, tag) in map {
        match tag {
            Value::String(s) => {
                tags.insert(key.clone(), s.clone());
            }
            Value::Bool(_) | Value::Number(_) => {
                tags.insert(key.clone(), tag.to_string());
            }
            _ => {
                return Err(Error::invalid_attribute(
                    "tags",
                    format!("the value of tag '{key}' must be a scalar"),
                ));
            }
        }
    }
    Ok(tags)
}

/// Flattens an API tag map back into the attribute value stored locally.
pub fn flatten(tags: &HashMap<String, String>) -> Value {
    Value::Object(
        tags.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}
