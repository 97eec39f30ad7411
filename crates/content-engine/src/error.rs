//! Error types for the content entity engine
//!
//! Every failure propagates to the caller as-is: the engine performs no
//! retries, no logging of propagated errors, and no partial-success
//! handling.

use content_schema::SchemaError;
use content_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// A single violated rule, collected with abort-early disabled so every
/// offending attribute is reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    /// Dotted path to the offending attribute; empty for the root payload
    pub path: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationFailure {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Main error type for entity operations
#[derive(Error, Debug)]
pub enum EntityError {
    /// The top-level payload was not an object
    #[error("Invalid payload submitted for {display_name}: expected an object")]
    InvalidPayload { display_name: String },

    /// One or more attribute rules were violated
    #[error("Validation failed with {} error(s): {}", .0.len(), format_failures(.0))]
    Validation(Vec<ValidationFailure>),

    /// Referenced relation or media ids do not exist in the target type
    #[error("{missing} relation(s) of type {target} associated with this entity do not exist")]
    RelationsNotFound { missing: u64, target: String },

    /// An update referenced a component id not currently linked to the
    /// entity being updated
    #[error("Component with id {id} is not related to entity on attribute '{attribute}'")]
    ComponentNotLinked { id: i64, attribute: String },

    /// A repeatable component or dynamic zone was given a non-array value
    #[error("Attribute '{attribute}' expects an array of components")]
    ExpectedArray { attribute: String },

    /// A single component attribute was given a non-object value
    #[error("Attribute '{attribute}' expects a component object")]
    ExpectedObject { attribute: String },

    /// A dynamic zone entry arrived without its __component tag
    #[error("Dynamic zone entry in '{attribute}' is missing a __component tag")]
    MissingComponentTag { attribute: String },

    /// Schema resolution failure
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Storage collaborator failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EntityError {
    /// Create a shape error for a non-object payload
    pub fn invalid_payload(display_name: impl Into<String>) -> Self {
        EntityError::InvalidPayload {
            display_name: display_name.into(),
        }
    }

    /// Create an aggregate validation error
    pub fn validation(failures: Vec<ValidationFailure>) -> Self {
        EntityError::Validation(failures)
    }

    /// Create a relation-existence error
    pub fn relations_not_found(missing: u64, target: impl Into<String>) -> Self {
        EntityError::RelationsNotFound {
            missing,
            target: target.into(),
        }
    }

    /// The failures carried by an aggregate validation error, if any
    pub fn failures(&self) -> Option<&[ValidationFailure]> {
        match self {
            EntityError::Validation(failures) => Some(failures),
            _ => None,
        }
    }
}

fn format_failures(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for entity operations
pub type Result<T> = std::result::Result<T, EntityError>;
