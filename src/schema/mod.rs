//! Schema subsystem for schemacast
//!
//! Schemas describe the expected shape of loosely typed records. They never
//! reject a document; they coerce what they can and report what they can't.
//!
//! # Design Principles
//!
//! - Declarations are normalized once into an immutable canonical form
//! - Castability is checked before every store
//! - Invalid values are reported, never raised
//! - Arrays are re-coerced on every read
//! - Deterministic coercion

mod catalog;
mod coerce;
mod decl;
mod errors;
mod loader;
mod normalizer;
mod options;
mod record;
mod types;
mod value;

pub use catalog::{can_cast, cast_to_type, default_value, map_shorthand};
pub use coerce::{coerce_array, coerce_nested, coerce_object, coerce_value};
pub use decl::{FieldDecl, SchemaDecl, SpecDecl};
pub use errors::{FailureKind, InvalidAssignment, SchemaError, SchemaResult};
pub use loader::{is_field_spec, load_file, load_str, parse_description, SchemaLoader, FIELD_OPTION_KEYS};
pub use normalizer::{normalize, normalize_field, normalize_shared};
pub use options::{AssignmentObserver, Options, RejectionLog};
pub use record::{Assignment, Record};
pub use types::{FieldSpec, FieldType, Getter, Nested, Schema, Setter};
pub use value::{Object, Pattern, Value};
