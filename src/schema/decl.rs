//! Schema declarations: the possibly-shorthand input to normalization
//!
//! Each field is declared with an explicit shape, so nothing has to be guessed
//! from key sets:
//! - `Shorthand(type)`: just a type
//! - `ArrayOf(decl)`: homogeneous array of the element declaration
//! - `Explicit(spec)`: type plus field options
//! - `SubSchema(schema)`: nested object schema
//! - `Canonical(spec)`: an already-normalized spec, kept as is

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::record::Record;
use super::types::{FieldSpec, FieldType, Getter, Schema, Setter};
use super::value::{Pattern, Value};

/// Declaration of a single field.
#[derive(Debug, Clone)]
pub enum FieldDecl {
    Shorthand(FieldType),
    ArrayOf(Option<Box<FieldDecl>>),
    Explicit(SpecDecl),
    SubSchema(SchemaDecl),
    Canonical(FieldSpec),
}

impl FieldDecl {
    /// `[T]` shorthand
    pub fn array_of(element: impl Into<FieldDecl>) -> Self {
        FieldDecl::ArrayOf(Some(Box::new(element.into())))
    }

    /// `[]` shorthand: an array with no element type
    pub fn untyped_array() -> Self {
        FieldDecl::ArrayOf(None)
    }
}

impl From<FieldType> for FieldDecl {
    fn from(field_type: FieldType) -> Self {
        FieldDecl::Shorthand(field_type)
    }
}

impl From<Pattern> for FieldDecl {
    fn from(pattern: Pattern) -> Self {
        FieldDecl::Shorthand(FieldType::Pattern(pattern))
    }
}

impl From<SpecDecl> for FieldDecl {
    fn from(spec: SpecDecl) -> Self {
        FieldDecl::Explicit(spec)
    }
}

impl From<SchemaDecl> for FieldDecl {
    fn from(schema: SchemaDecl) -> Self {
        FieldDecl::SubSchema(schema)
    }
}

impl From<FieldSpec> for FieldDecl {
    fn from(spec: FieldSpec) -> Self {
        FieldDecl::Canonical(spec)
    }
}

/// Explicit field declaration with options.
#[derive(Clone, Default)]
pub struct SpecDecl {
    pub(crate) field_type: Option<FieldType>,
    pub(crate) schema: Option<Box<FieldDecl>>,
    pub(crate) default: Option<Value>,
    pub(crate) get: Option<Getter>,
    pub(crate) set: Option<Setter>,
    pub(crate) enumerable: Option<bool>,
    pub(crate) dynamic: bool,
    pub(crate) index: bool,
    pub(crate) unique: bool,
    pub(crate) sparse: bool,
}

impl SpecDecl {
    /// Declaration of the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    /// Declaration without a type; useful for derived fields
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Nested declaration: sub-schema for objects, element for arrays
    pub fn schema(mut self, nested: impl Into<FieldDecl>) -> Self {
        self.schema = Some(Box::new(nested.into()));
        self
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn getter<F>(mut self, get: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        self.get = Some(Arc::new(get));
        self
    }

    pub fn setter<F>(mut self, set: F) -> Self
    where
        F: Fn(&mut Record, Value) + Send + Sync + 'static,
    {
        self.set = Some(Arc::new(set));
        self
    }

    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }
}

impl fmt::Debug for SpecDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecDecl")
            .field("field_type", &self.field_type)
            .field("schema", &self.schema)
            .field("default", &self.default)
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .field("enumerable", &self.enumerable)
            .field("dynamic", &self.dynamic)
            .finish_non_exhaustive()
    }
}

/// Declaration of a whole schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaDecl {
    pub(crate) fields: BTreeMap<String, FieldDecl>,
}

impl SchemaDecl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a field declaration
    pub fn field(mut self, name: impl Into<String>, decl: impl Into<FieldDecl>) -> Self {
        self.fields.insert(name.into(), decl.into());
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A canonical schema re-declared field by field, so normalizing it again is a no-op.
impl From<Schema> for SchemaDecl {
    fn from(schema: Schema) -> Self {
        Self {
            fields: schema
                .fields()
                .map(|(name, spec)| (name.to_string(), FieldDecl::Canonical(spec.clone())))
                .collect(),
        }
    }
}

impl From<&Schema> for SchemaDecl {
    fn from(schema: &Schema) -> Self {
        schema.clone().into()
    }
}
