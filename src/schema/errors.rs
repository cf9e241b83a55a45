//! Schema error types
//!
//! Two families:
//! - `SchemaError`: a schema description could not be loaded (JSON boundary only)
//! - `InvalidAssignment`: a value failed castability for a field; never returned
//!   as `Err` by the engine, only reported

use std::fmt;

use thiserror::Error;

use super::types::FieldType;
use super::value::Value;

/// Result type for schema loading
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while reading a schema description
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("Malformed schema JSON: {0}")]
    MalformedJson(String),

    #[error("Failed to read schema file '{path}': {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Schema description must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("Field '{field}': invalid pattern {source_text}: {reason}")]
    InvalidPattern {
        field: String,
        source_text: String,
        reason: String,
    },

    #[error("Field '{field}': unsupported declaration {found}")]
    UnsupportedDeclaration { field: String, found: String },

    #[error("Field '{0}': accessors cannot be declared in JSON")]
    AccessorInJson(String),

    #[error("Schema already registered: {0}")]
    AlreadyRegistered(String),
}

impl SchemaError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::MalformedJson(_) => "SCHEMA_MALFORMED_JSON",
            SchemaError::Unreadable { .. } => "SCHEMA_UNREADABLE",
            SchemaError::NotAnObject(_) => "SCHEMA_NOT_AN_OBJECT",
            SchemaError::InvalidPattern { .. } => "SCHEMA_INVALID_PATTERN",
            SchemaError::UnsupportedDeclaration { .. } => "SCHEMA_UNSUPPORTED_DECLARATION",
            SchemaError::AccessorInJson(_) => "SCHEMA_ACCESSOR_IN_JSON",
            SchemaError::AlreadyRegistered(_) => "SCHEMA_ALREADY_REGISTERED",
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        SchemaError::MalformedJson(e.to_string())
    }
}

/// Where an invalid value was encountered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Setter received a non-castable value
    Assignment,
    /// Pre-existing object value was not castable at construction
    ExistingValue,
    /// Declared default was not castable
    Default,
    /// Array element dropped during coercion
    ArrayElement,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Assignment => "assignment",
            FailureKind::ExistingValue => "existing_value",
            FailureKind::Default => "default",
            FailureKind::ArrayElement => "array_element",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that does not satisfy castability for a declared type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {kind} for '{field}': {value} is not castable to {expected}")]
pub struct InvalidAssignment {
    /// Field path (e.g. "address.zip", "tags[2]")
    pub field: String,
    /// The offending value
    pub value: Value,
    /// Declared type
    pub expected: FieldType,
    /// Where the failure happened
    pub kind: FailureKind,
}

impl InvalidAssignment {
    pub fn new(field: impl Into<String>, value: Value, expected: FieldType, kind: FailureKind) -> Self {
        Self {
            field: field.into(),
            value,
            expected,
            kind,
        }
    }
}
