//! Attribute validation rules.
//!
//! Each function builds a [`Validator`] closure for use in schema
//! declarations. Validators run after the value's type has been checked,
//! so string rules may assume a string value is present.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::arm::id::ResourceId;
use crate::error::Error;
use crate::schema::Validator;

// regex pulled from the resource group CreateOrUpdate API reference
static RESOURCE_GROUP_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-\w\._\(\)]+$").expect("invalid resource group name regex"));

// https://docs.microsoft.com/en-us/azure/data-factory/naming-rules
static DATA_FACTORY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*$").expect("invalid data factory name regex"));

const INTEGRATION_RUNTIME_FORBIDDEN: &[char] =
    &['.', '+', '?', '/', '<', '>', '*', '%', '&', ':', '\\'];

fn as_str(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

/// The value must be a non-empty string.
pub fn non_empty() -> Validator {
    Arc::new(|name, value| {
        if as_str(value).is_empty() {
            Err(Error::invalid_attribute(name, "must not be empty"))
        } else {
            Ok(())
        }
    })
}

/// The value must be a valid JSON document.
pub fn json_string() -> Validator {
    Arc::new(|name, value| {
        serde_json::from_str::<Value>(as_str(value))
            .map(|_| ())
            .map_err(|source| Error::JsonAttribute {
                attribute: name.to_string(),
                source,
            })
    })
}

/// The value must parse as a composite ARM resource identifier.
pub fn resource_id() -> Validator {
    Arc::new(|name, value| {
        ResourceId::parse(as_str(value))
            .map(|_| ())
            .map_err(|err| Error::invalid_attribute(name, err.to_string()))
    })
}

/// The value must be a well-formed resource group name: at most 80
/// characters, no trailing period, and only alphanumerics, dashes,
/// underscores, parentheses and periods.
pub fn resource_group_name() -> Validator {
    Arc::new(|name, value| {
        let value = as_str(value);
        if value.len() > 80 {
            return Err(Error::invalid_attribute(
                name,
                "may not exceed 80 characters in length",
            ));
        }
        if value.ends_with('.') {
            return Err(Error::invalid_attribute(name, "may not end with a period"));
        }
        if !RESOURCE_GROUP_NAME.is_match(value) {
            return Err(Error::invalid_attribute(
                name,
                "may only contain alphanumeric characters, dash, underscores, parentheses and periods",
            ));
        }
        Ok(())
    })
}

/// The value must be a well-formed data factory name.
pub fn data_factory_name() -> Validator {
    Arc::new(|name, value| {
        if DATA_FACTORY_NAME.is_match(as_str(value)) {
            Ok(())
        } else {
            Err(Error::invalid_attribute(
                name,
                "must start and end with an alphanumeric character and may contain single dashes, see https://docs.microsoft.com/en-us/azure/data-factory/naming-rules",
            ))
        }
    })
}

/// The value must be a well-formed integration runtime name.
pub fn integration_runtime_name() -> Validator {
    Arc::new(|name, value| {
        if as_str(value).contains(INTEGRATION_RUNTIME_FORBIDDEN) {
            Err(Error::invalid_attribute(
                name,
                r"any of '.', '+', '?', '/', '<', '>', '*', '%', '&', ':', '\' are not allowed",
            ))
        } else {
            Ok(())
        }
    })
}

/// The value must be an integer within the inclusive range.
pub fn int_between(min: i64, max: i64) -> Validator {
    Arc::new(move |name, value| {
        let n = value.as_i64().unwrap_or_default();
        if n < min || n > max {
            Err(Error::invalid_attribute(
                name,
                format!("must be between {min} and {max}"),
            ))
        } else {
            Ok(())
        }
    })
}

/// The value must equal one of the listed strings.
pub fn one_of(allowed: &'static [&'static str]) -> Validator {
    Arc::new(move |name, value| {
        let value = as_str(value);
        if allowed.iter().any(|candidate| *candidate == value) {
            Ok(())
        } else {
            Err(Error::invalid_attribute(
                name,
                format!("expected one of: {}", allowed.join(", ")),
            ))
        }
    })
}

/// The value must be a valid tag map: at most 50 entries, keys no longer
/// than 512 characters, scalar values no longer than 256 characters.
pub fn tags() -> Validator {
    Arc::new(|name, value| {
        let Some(map) = value.as_object() else {
            return Err(Error::invalid_attribute(name, "expected a map of string values"));
        };
        if map.len() > 50 {
            return Err(Error::invalid_attribute(
                name,
                "a maximum of 50 tags can be applied to a resource",
            ));
        }
        for (key, tag) in map {
            if key.len() > 512 {
                return Err(Error::invalid_attribute(
                    name,
                    format!("the tag name '{key}' exceeds the maximum length of 512 characters"),
                ));
            }
            if tag.is_object() || tag.is_array() {
                return Err(Error::invalid_attribute(
                    name,
                    format!("the value of tag '{key}' must be a scalar"),
                ));
            }
            if tag.as_str().map_or(false, |s| s.len() > 256) {
                return Err(Error::invalid_attribute(
                    name,
                    format!("the value of tag '{key}' exceeds the maximum length of 256 characters"),
                ));
            }
        }
        Ok(())
    })
}
