//! Canonical schema type definitions
//!
//! Supported types:
//! - string, number, boolean, date: primitive coercion targets
//! - array: sequence, optionally with an element spec
//! - object: mapping, optionally with a nested schema
//! - mixed / any: accept everything unchanged
//! - regexp: compiled pattern values
//! - pattern: text constrained by a regular expression

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::record::Record;
use super::value::{Pattern, Value};

/// Canonical type identifiers.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// UTF-8 text
    String,
    /// 64-bit float
    Number,
    /// Boolean
    Boolean,
    /// Point in time
    Date,
    /// Ordered sequence
    Array,
    /// Field mapping
    Object,
    /// Anything, stored unchanged
    Mixed,
    /// The explicit "always accept" marker
    Any,
    /// Compiled regular expression values
    RegExp,
    /// Text that must match the pattern; the pattern is the type
    Pattern(Pattern),
    /// Unrecognized tag, matched only by runtime type name
    Other(String),
}

impl FieldType {
    /// Returns the type name for diagnostics
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Mixed => "mixed",
            FieldType::Any => "any",
            FieldType::RegExp => "regexp",
            FieldType::Pattern(_) => "pattern",
            FieldType::Other(tag) => tag,
        }
    }

    /// Whether values of this type may carry a nested schema.
    pub fn is_structural(&self) -> bool {
        matches!(self, FieldType::Array | FieldType::Object)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Pattern(p) => write!(f, "{}", p),
            other => f.write_str(other.type_name()),
        }
    }
}

impl From<Pattern> for FieldType {
    fn from(pattern: Pattern) -> Self {
        FieldType::Pattern(pattern)
    }
}

/// User getter for a derived field.
pub type Getter = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// User setter for a derived field.
pub type Setter = Arc<dyn Fn(&mut Record, Value) + Send + Sync>;

/// Nested schema carried by a structural field.
#[derive(Debug, Clone, PartialEq)]
pub enum Nested {
    /// Sub-schema for an object field
    Fields(Arc<Schema>),
    /// Element spec for an array field
    Element(Box<FieldSpec>),
}

/// Canonical, immutable description of one field.
#[derive(Clone, Default)]
pub struct FieldSpec {
    /// Declared type; `None` leaves the field uninstrumented
    pub field_type: Option<FieldType>,
    /// Nested schema for object or array fields
    pub schema: Option<Nested>,
    /// Raw default, checked against the type at construction
    pub default: Option<Value>,
    /// Derived getter
    pub get: Option<Getter>,
    /// Derived setter
    pub set: Option<Setter>,
    /// Whether the field shows up in enumeration
    pub enumerable: bool,
    /// Live accessor even when static-by-default is on
    pub dynamic: bool,
    /// Inert persistence hints
    pub index: bool,
    pub unique: bool,
    pub sparse: bool,
}

impl FieldSpec {
    /// Create a spec of the given type
    pub fn of(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            enumerable: true,
            ..Self::default()
        }
    }

    /// Create an object field with a nested schema
    pub fn object(schema: Schema) -> Self {
        Self {
            schema: Some(Nested::Fields(Arc::new(schema))),
            ..Self::of(FieldType::Object)
        }
    }

    /// Create an array field with an element spec
    pub fn array_of(element: FieldSpec) -> Self {
        Self {
            schema: Some(Nested::Element(Box::new(element))),
            ..Self::of(FieldType::Array)
        }
    }

    /// Create a derived field from accessor functions
    pub fn derived(get: Option<Getter>, set: Option<Setter>) -> Self {
        Self {
            get,
            set,
            enumerable: true,
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    pub fn with_dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    /// True when the field is a pure get/set accessor.
    pub fn is_derived(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// Sub-schema of an object field, if any.
    pub fn fields(&self) -> Option<&Arc<Schema>> {
        match &self.schema {
            Some(Nested::Fields(schema)) => Some(schema),
            _ => None,
        }
    }

    /// Element spec of an array field, if any.
    pub fn element(&self) -> Option<&FieldSpec> {
        match &self.schema {
            Some(Nested::Element(spec)) => Some(spec),
            _ => None,
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("field_type", &self.field_type)
            .field("schema", &self.schema)
            .field("default", &self.default)
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .field("enumerable", &self.enumerable)
            .field("dynamic", &self.dynamic)
            .field("index", &self.index)
            .field("unique", &self.unique)
            .field("sparse", &self.sparse)
            .finish()
    }
}

/// Accessors compare by identity.
impl PartialEq for FieldSpec {
    fn eq(&self, other: &Self) -> bool {
        fn same<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
        }

        self.field_type == other.field_type
            && self.schema == other.schema
            && self.default == other.default
            && same(&self.get, &other.get)
            && same(&self.set, &other.set)
            && self.enumerable == other.enumerable
            && self.dynamic == other.dynamic
            && self.index == other.index
            && self.unique == other.unique
            && self.sparse == other.sparse
    }
}

/// Canonical schema: field name to spec.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: BTreeMap<String, FieldSpec>,
}

impl Schema {
    /// Create a new schema
    pub fn new(fields: BTreeMap<String, FieldSpec>) -> Self {
        Self { fields }
    }

    /// Builder-style field insertion
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders the canonical form as JSON. Accessors cannot be rendered and are
    /// emitted as `true` markers.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(name, spec)| (name.clone(), spec_to_json(spec)))
                .collect(),
        )
    }
}

fn type_to_json(field_type: &FieldType) -> serde_json::Value {
    match field_type {
        FieldType::Any => serde_json::Value::Bool(true),
        FieldType::Pattern(p) => serde_json::Value::String(p.to_string()),
        other => serde_json::Value::String(other.type_name().to_string()),
    }
}

fn spec_to_json(spec: &FieldSpec) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    if let Some(field_type) = &spec.field_type {
        out.insert("type".into(), type_to_json(field_type));
    }
    match &spec.schema {
        Some(Nested::Fields(schema)) => {
            out.insert("schema".into(), schema.to_json());
        }
        Some(Nested::Element(element)) => {
            out.insert("schema".into(), spec_to_json(element));
        }
        None => {}
    }
    if let Some(default) = &spec.default {
        out.insert("default".into(), default.to_json());
    }
    if spec.get.is_some() {
        out.insert("get".into(), serde_json::Value::Bool(true));
    }
    if spec.set.is_some() {
        out.insert("set".into(), serde_json::Value::Bool(true));
    }
    if !spec.enumerable {
        out.insert("enumerable".into(), serde_json::Value::Bool(false));
    }
    for (key, flag) in [
        ("dynamic", spec.dynamic),
        ("index", spec.index),
        ("unique", spec.unique),
        ("sparse", spec.sparse),
    ] {
        if flag {
            out.insert(key.into(), serde_json::Value::Bool(true));
        }
    }
    serde_json::Value::Object(out)
}
