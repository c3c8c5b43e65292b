//! Error types for Armature.
//!
//! This module defines the error types used throughout Armature, providing
//! rich error information for debugging and user feedback. Errors fall into
//! the categories the reconciliation contract distinguishes: configuration
//! validation, identifier parsing, conflicts with pre-existing remote
//! objects, remote API failures, and invariant violations.

use thiserror::Error;

use crate::client::ApiError;

/// Result type alias for Armature operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Armature.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// A required attribute was not supplied.
    #[error("Missing required attribute '{0}'")]
    MissingAttribute(String),

    /// An attribute value failed validation.
    #[error("Invalid value for attribute '{attribute}': {message}")]
    InvalidAttribute {
        /// Attribute name
        attribute: String,
        /// Error message
        message: String,
    },

    /// Two mutually-exclusive attributes were both supplied.
    #[error("Attribute '{first}' conflicts with '{second}': only one may be set")]
    ConflictingAttributes {
        /// First attribute name
        first: String,
        /// Second attribute name
        second: String,
    },

    /// An attribute not declared in the schema was supplied.
    #[error("Unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// A JSON-string attribute could not be decoded.
    #[error("Unable to parse attribute '{attribute}' as JSON: {source}")]
    JsonAttribute {
        /// Attribute name
        attribute: String,
        /// Decode error
        #[source]
        source: serde_json::Error,
    },

    // ========================================================================
    // Identifier Errors
    // ========================================================================
    /// A composite resource identifier could not be parsed.
    #[error("Unable to parse resource id '{id}': {message}")]
    ParseId {
        /// The identifier that failed to parse
        id: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Reconciliation Errors
    // ========================================================================
    /// A remote object already exists at the target identifier and the host
    /// forbids silently adopting it.
    #[error("A {resource_type} already exists with id {id} - import it into state to manage it")]
    AlreadyExists {
        /// Resource type name
        resource_type: String,
        /// Identifier of the conflicting remote object
        id: String,
    },

    /// A data-source lookup found no remote object.
    #[error("{resource_type} '{name}' was not found")]
    NotFound {
        /// Resource type name
        resource_type: String,
        /// Name that was looked up
        name: String,
    },

    /// A remote call failed; wrapped with resource-identifying context and
    /// surfaced unchanged, never retried locally.
    #[error("{context}: {source}")]
    Api {
        /// Resource-identifying context for the failed call
        context: String,
        /// The underlying API error
        #[source]
        source: ApiError,
    },

    /// The remote system reported no identifier for an object that should
    /// have one. This is an invariant violation, not a transient condition.
    #[error("{context} returned no identifier")]
    MissingRemoteId {
        /// Resource-identifying context
        context: String,
    },

    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// No handler is registered under the requested type name.
    #[error("Resource type '{0}' is not registered")]
    UnknownResourceType(String),
}

impl Error {
    /// Creates a new invalid attribute error.
    pub fn invalid_attribute(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Creates a new conflicting attributes error.
    pub fn conflicting_attributes(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::ConflictingAttributes {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Creates a new identifier parse error.
    pub fn parse_id(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseId {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a new already-exists conflict error.
    pub fn already_exists(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Wraps a remote API failure with resource-identifying context.
    pub fn api(context: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            context: context.into(),
            source,
        }
    }

    /// Creates a new missing-remote-id invariant error.
    pub fn missing_remote_id(context: impl Into<String>) -> Self {
        Self::MissingRemoteId {
            context: context.into(),
        }
    }

    /// Returns true if this error was raised by configuration validation
    /// before any remote call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingAttribute(_)
                | Error::InvalidAttribute { .. }
                | Error::ConflictingAttributes { .. }
                | Error::UnknownAttribute(_)
                | Error::JsonAttribute { .. }
        )
    }
}
