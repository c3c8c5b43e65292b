//! Local state for a single resource instance.
//!
//! [`ResourceState`] is the attribute accessor/mutator handed to every
//! handler entry point. It carries the locally persisted composite
//! identifier and the flat attribute map the host's diff engine compares
//! against remote state. Handlers read configuration through the typed
//! getters and write authoritative remote values back through the setters.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};

/// Attribute values keyed by attribute name.
pub type AttributeMap = HashMap<String, Value>;

/// Locally persisted state for one resource instance.
///
/// The composite identifier is the sole correlation key between local
/// configuration and the remote object; the attribute map is the only
/// mutable surface. Nothing here is cached across operations - every
/// handler call re-fetches from the remote system.
#[derive(Debug, Clone, Default)]
pub struct ResourceState {
    id: Option<String>,
    attrs: AttributeMap,
}

impl ResourceState {
    /// Creates empty state for a resource that does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates state from configured attribute values, with no identifier
    /// persisted yet.
    pub fn from_attributes(attrs: AttributeMap) -> Self {
        Self { id: None, attrs }
    }

    /// Creates state with a previously persisted identifier.
    pub fn with_id(id: impl Into<String>, attrs: AttributeMap) -> Self {
        Self {
            id: Some(id.into()),
            attrs,
        }
    }

    /// The locally persisted composite identifier, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Persists the composite identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Clears the persisted identifier so the host treats the resource as
    /// absent. Expected outcome of reading a remote object that is gone.
    pub fn clear(&mut self) {
        self.id = None;
    }

    /// True if no identifier has been persisted: the logical resource is
    /// new and has never been created remotely.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// All attribute values.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attrs
    }

    /// Raw attribute value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key).filter(|v| !v.is_null())
    }

    /// String attribute value. Non-string scalars are coerced to their
    /// string representation.
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Array(_) | Value::Object(_)) => Err(Error::invalid_attribute(
                key,
                "expected a string value",
            )),
            Some(v) => Ok(Some(v.to_string())),
            None => Ok(None),
        }
    }

    /// String attribute value, required.
    pub fn get_string_required(&self, key: &str) -> Result<String> {
        self.get_string(key)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::MissingAttribute(key.to_string()))
    }

    /// Boolean attribute value.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Some(true)),
                "false" | "no" | "0" | "off" => Ok(Some(false)),
                _ => Err(Error::invalid_attribute(key, "expected a boolean value")),
            },
            Some(_) => Err(Error::invalid_attribute(key, "expected a boolean value")),
            None => Ok(None),
        }
    }

    /// Boolean attribute value with a default.
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).ok().flatten().unwrap_or(default)
    }

    /// Integer attribute value.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| Error::invalid_attribute(key, "expected an integer value")),
            Some(Value::String(s)) => s
                .parse()
                .map(Some)
                .map_err(|_| Error::invalid_attribute(key, "expected an integer value")),
            Some(_) => Err(Error::invalid_attribute(key, "expected an integer value")),
            None => Ok(None),
        }
    }

    /// Integer attribute value, required.
    pub fn get_i64_required(&self, key: &str) -> Result<i64> {
        self.get_i64(key)?
            .ok_or_else(|| Error::MissingAttribute(key.to_string()))
    }

    /// Object attribute value (nested block or map attribute).
    pub fn get_object(&self, key: &str) -> Result<Option<&serde_json::Map<String, Value>>> {
        match self.get(key) {
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(Error::invalid_attribute(key, "expected an object value")),
            None => Ok(None),
        }
    }

    /// Stores an attribute value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Stores an attribute value when present, otherwise removes it.
    pub fn set_opt(&mut self, key: &str, value: Option<impl Into<Value>>) {
        match value {
            Some(v) => {
                self.attrs.insert(key.to_string(), v.into());
            }
            None => {
                self.attrs.remove(key);
            }
        }
    }

    /// Removes an attribute value.
    pub fn remove(&mut self, key: &str) {
        self.attrs.remove(key);
    }
}
