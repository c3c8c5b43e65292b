//! Schema declaration for resources and data sources.
//!
//! A [`Schema`] enumerates the attribute set of one resource type: value
//! type, required/optional/computed disposition, immutability (whether a
//! change forces replacement), sensitivity (whether the value is withheld
//! from diff output), validation rules, drift-suppression hints, and
//! mutual-exclusion constraints. The host's diff engine consumes the
//! declarative metadata; [`Schema::validate`] runs synchronously before any
//! remote call is made on behalf of the configuration.

pub mod validators;

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::state::AttributeMap;

/// Value type of an attribute at the configuration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// UTF-8 string. JSON-blob attributes are strings with a JSON validator.
    String,
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Flat string-to-string map (tags).
    Map,
    /// Single nested attribute block with its own schema.
    Block,
}

/// Drift-suppression hint for the host's diff engine.
///
/// Some values come back from the service in a normalized-but-different
/// form; comparing them verbatim would flag spurious drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffSuppress {
    /// Compare verbatim.
    #[default]
    None,
    /// Compare case-insensitively.
    CaseInsensitive,
    /// Compare as parsed JSON documents; key order and whitespace are
    /// irrelevant.
    JsonEquivalent,
    /// Compare as normalized Azure region names.
    Location,
}

/// Validation callback: attribute name plus supplied value.
pub type Validator = Arc<dyn Fn(&str, &Value) -> Result<()> + Send + Sync>;

/// Declaration of a single attribute.
#[derive(Clone)]
pub struct Attribute {
    kind: AttributeType,
    required: bool,
    computed: bool,
    force_new: bool,
    sensitive: bool,
    deprecated: Option<&'static str>,
    conflicts_with: Vec<&'static str>,
    diff_suppress: DiffSuppress,
    validators: Vec<Validator>,
    block: Option<Box<Schema>>,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("computed", &self.computed)
            .field("force_new", &self.force_new)
            .field("sensitive", &self.sensitive)
            .field("conflicts_with", &self.conflicts_with)
            .field("diff_suppress", &self.diff_suppress)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl Attribute {
    fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            required: false,
            computed: false,
            force_new: false,
            sensitive: false,
            deprecated: None,
            conflicts_with: Vec::new(),
            diff_suppress: DiffSuppress::None,
            validators: Vec::new(),
            block: None,
        }
    }

    /// A string attribute.
    pub fn string() -> Self {
        Self::new(AttributeType::String)
    }

    /// A boolean attribute.
    pub fn bool() -> Self {
        Self::new(AttributeType::Bool)
    }

    /// An integer attribute.
    pub fn int() -> Self {
        Self::new(AttributeType::Int)
    }

    /// A string-to-string map attribute.
    pub fn map() -> Self {
        Self::new(AttributeType::Map)
    }

    /// A single nested block with its own schema.
    pub fn block(schema: Schema) -> Self {
        let mut attr = Self::new(AttributeType::Block);
        attr.block = Some(Box::new(schema));
        attr
    }

    /// The attribute must be supplied by configuration.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The attribute value is produced by the service and written back by
    /// the read handler.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Changing the attribute forces replacement of the remote object
    /// instead of an in-place update.
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// The value is withheld from diff output.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// The attribute is kept for a deprecation window only.
    pub fn deprecated(mut self, message: &'static str) -> Self {
        self.deprecated = Some(message);
        self
    }

    /// The attribute may not be set together with any of the named ones.
    pub fn conflicts_with(mut self, others: &[&'static str]) -> Self {
        self.conflicts_with.extend_from_slice(others);
        self
    }

    /// Drift-suppression hint for the diff engine.
    pub fn diff_suppress(mut self, suppress: DiffSuppress) -> Self {
        self.diff_suppress = suppress;
        self
    }

    /// Adds a validation rule.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Value type of the attribute.
    pub fn kind(&self) -> AttributeType {
        self.kind
    }

    /// True if configuration must supply the attribute.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// True if the service owns the value.
    pub fn is_computed(&self) -> bool {
        self.computed
    }

    /// True if a change forces replacement.
    pub fn is_force_new(&self) -> bool {
        self.force_new
    }

    /// True if the value is withheld from diff output.
    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    /// Deprecation message, if the attribute is deprecated.
    pub fn deprecation(&self) -> Option<&'static str> {
        self.deprecated
    }

    /// Drift-suppression hint.
    pub fn suppress(&self) -> DiffSuppress {
        self.diff_suppress
    }

    /// Nested block schema, for [`AttributeType::Block`] attributes.
    pub fn nested(&self) -> Option<&Schema> {
        self.block.as_deref()
    }

    fn check_type(&self, name: &str, value: &Value) -> Result<()> {
        let ok = match self.kind {
            AttributeType::String => value.is_string(),
            AttributeType::Bool => value.is_boolean(),
            AttributeType::Int => value.is_i64() || value.is_u64(),
            AttributeType::Map | AttributeType::Block => value.is_object(),
        };
        if ok {
            Ok(())
        } else {
            Err(Error::invalid_attribute(
                name,
                match self.kind {
                    AttributeType::String => "expected a string value",
                    AttributeType::Bool => "expected a boolean value",
                    AttributeType::Int => "expected an integer value",
                    AttributeType::Map => "expected a map of string values",
                    AttributeType::Block => "expected a nested block",
                },
            ))
        }
    }
}

/// Ordered attribute declarations for one resource type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: IndexMap<&'static str, Attribute>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an attribute. Order of declaration is preserved.
    pub fn attribute(mut self, name: &'static str, attr: Attribute) -> Self {
        self.attributes.insert(name, attr);
        self
    }

    /// Looks up an attribute declaration.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Iterates attribute declarations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (*k, v))
    }

    /// Names of attributes whose change forces replacement.
    pub fn force_new_attributes(&self) -> Vec<&'static str> {
        self.iter()
            .filter(|(_, a)| a.is_force_new())
            .map(|(n, _)| n)
            .collect()
    }

    /// Names of attributes withheld from diff output.
    pub fn sensitive_attributes(&self) -> Vec<&'static str> {
        self.iter()
            .filter(|(_, a)| a.is_sensitive())
            .map(|(n, _)| n)
            .collect()
    }

    /// Validates configured attribute values against this schema.
    ///
    /// Checks, in order: no undeclared attributes, all required attributes
    /// present and non-null, value types match, per-attribute validators
    /// pass, no mutually-exclusive pair is doubly set, and nested blocks
    /// validate recursively. Runs before any remote call.
    pub fn validate(&self, attrs: &AttributeMap) -> Result<()> {
        for key in attrs.keys() {
            if !self.attributes.contains_key(key.as_str()) {
                return Err(Error::UnknownAttribute(key.clone()));
            }
        }

        for (name, attr) in self.iter() {
            let value = attrs.get(name).filter(|v| !v.is_null());

            match value {
                None => {
                    if attr.is_required() {
                        return Err(Error::MissingAttribute(name.to_string()));
                    }
                }
                Some(value) => {
                    attr.check_type(name, value)?;
                    for validator in &attr.validators {
                        validator(name, value)?;
                    }
                    for other in &attr.conflicts_with {
                        if attrs.get(*other).map_or(false, |v| !v.is_null()) {
                            return Err(Error::conflicting_attributes(name, *other));
                        }
                    }
                    if let (AttributeType::Block, Some(nested)) = (attr.kind, attr.nested()) {
                        let inner: AttributeMap = value
                            .as_object()
                            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                            .unwrap_or_default();
                        nested.validate(&inner).map_err(|err| match err {
                            Error::MissingAttribute(inner_name) => Error::MissingAttribute(
                                format!("{name}.{inner_name}"),
                            ),
                            Error::UnknownAttribute(inner_name) => Error::UnknownAttribute(
                                format!("{name}.{inner_name}"),
                            ),
                            Error::InvalidAttribute { attribute, message } => {
                                Error::invalid_attribute(format!("{name}.{attribute}"), message)
                            }
                            other => other,
                        })?;
                    }
                }
            }
        }

        Ok(())
    }
}
