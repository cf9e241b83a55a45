//! Observable coercion events
//!
//! Events are explicit and typed; the string form is the `event` field of the
//! emitted tracing record.

use std::fmt;

use crate::schema::FailureKind;

/// Observable events in the coercion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Schema lifecycle
    /// Schema description loaded and normalized
    SchemaLoaded,
    /// Accessors installed on a record
    RecordInstrumented,

    // Assignments
    /// Setter stored a coerced value
    FieldAssigned,
    /// Setter rejected a value
    FieldInvalidAssignment,
    /// Pre-existing value rejected at construction
    ExistingValueRejected,
    /// Declared default rejected at construction
    DefaultRejected,

    // Arrays
    /// Element removed by array coercion
    ArrayElementDropped,

    // Command line
    /// One document coerced by the CLI
    DocumentCoerced,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::RecordInstrumented => "RECORD_INSTRUMENTED",
            Event::FieldAssigned => "FIELD_ASSIGNED",
            Event::FieldInvalidAssignment => "FIELD_INVALID_ASSIGNMENT",
            Event::ExistingValueRejected => "EXISTING_VALUE_REJECTED",
            Event::DefaultRejected => "DEFAULT_REJECTED",
            Event::ArrayElementDropped => "ARRAY_ELEMENT_DROPPED",
            Event::DocumentCoerced => "DOCUMENT_COERCED",
        }
    }

    /// Event emitted for a failure of the given kind
    pub fn for_failure(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Assignment => Event::FieldInvalidAssignment,
            FailureKind::ExistingValue => Event::ExistingValueRejected,
            FailureKind::Default => Event::DefaultRejected,
            FailureKind::ArrayElement => Event::ArrayElementDropped,
        }
    }

    /// Returns true if this event reports a rejected value
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Event::FieldInvalidAssignment
                | Event::ExistingValueRejected
                | Event::DefaultRejected
                | Event::ArrayElementDropped
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
