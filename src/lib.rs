//! schemacast - runtime schema enforcement and coercion for loosely typed records
//!
//! Declare a schema, instrument an object with it, and every later read and
//! write is coerced to the declared types. Values that cannot be coerced are
//! reported, never raised.
//!
//! ```ignore
//! use schemacast::{instrument, FieldType, Object, Options, SchemaDecl};
//!
//! let schema = SchemaDecl::new().field("count", FieldType::Number);
//! let mut record = instrument(Object::new(), schema, Options::new());
//! record.set("count", "7");
//! assert_eq!(record.get("count"), Some(7.into()));
//! ```

pub mod cli;
pub mod observability;
pub mod schema;

pub use schema::{
    Assignment, FieldDecl, FieldSpec, FieldType, Object, Options, Pattern, Record, Schema,
    SchemaDecl, SpecDecl, Value,
};

use schema::{coerce_array, normalize_field, normalize_shared};

/// Normalizes `schema` and instruments `object` with it.
pub fn instrument(object: Object, schema: impl Into<SchemaDecl>, options: Options) -> Record {
    Record::construct(object, normalize_shared(schema), options)
}

/// Coerces `items` in place against an element declaration. Uncastable
/// elements are removed and reported.
pub fn instrument_array(items: &mut Vec<Value>, element: impl Into<FieldDecl>, options: &Options) {
    let element = normalize_field(element.into());
    coerce_array(items, Some(&element), "", options);
}
