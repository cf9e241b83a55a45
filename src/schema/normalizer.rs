//! Schema normalizer: expands declarations into canonical field specs
//!
//! - `Shorthand(T)` becomes `{ type: T }`
//! - `ArrayOf(T)` becomes `{ type: array, schema: normalize(T) }`
//! - `SubSchema(m)` becomes `{ type: object, schema: normalize(m) }`
//! - `Explicit(spec)` keeps its options; a nested declaration is normalized
//! - `Canonical(spec)` is returned untouched, which makes normalization idempotent

use std::sync::Arc;

use super::decl::{FieldDecl, SchemaDecl, SpecDecl};
use super::types::{FieldSpec, FieldType, Nested, Schema};

/// Normalizes a schema declaration into its canonical form.
pub fn normalize(decl: impl Into<SchemaDecl>) -> Schema {
    let decl = decl.into();
    Schema::new(
        decl.fields
            .into_iter()
            .map(|(name, field)| (name, normalize_field(field)))
            .collect(),
    )
}

/// Normalizes a single field declaration.
pub fn normalize_field(decl: FieldDecl) -> FieldSpec {
    match decl {
        FieldDecl::Canonical(spec) => spec,
        FieldDecl::Shorthand(field_type) => FieldSpec::of(field_type),
        FieldDecl::ArrayOf(Some(element)) => FieldSpec::array_of(normalize_field(*element)),
        FieldDecl::ArrayOf(None) => FieldSpec::of(FieldType::Array),
        FieldDecl::SubSchema(schema) => FieldSpec::object(normalize(schema)),
        FieldDecl::Explicit(spec) => normalize_explicit(spec),
    }
}

fn normalize_explicit(decl: SpecDecl) -> FieldSpec {
    let schema = match (&decl.field_type, decl.schema) {
        (Some(FieldType::Object), Some(nested)) => match normalize_field(*nested).schema {
            Some(Nested::Fields(fields)) => Some(Nested::Fields(fields)),
            // a non-object nested declaration has nothing to contribute
            _ => None,
        },
        (Some(FieldType::Array), Some(element)) => {
            Some(Nested::Element(Box::new(normalize_field(*element))))
        }
        _ => None,
    };

    FieldSpec {
        field_type: decl.field_type,
        schema,
        default: decl.default,
        get: decl.get,
        set: decl.set,
        enumerable: decl.enumerable.unwrap_or(true),
        dynamic: decl.dynamic,
        index: decl.index,
        unique: decl.unique,
        sparse: decl.sparse,
    }
}

/// Normalizes and wraps for sharing across records.
pub fn normalize_shared(decl: impl Into<SchemaDecl>) -> Arc<Schema> {
    Arc::new(normalize(decl))
}
