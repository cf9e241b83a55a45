//! Instrumented records
//!
//! A `Record` wraps an object and enforces its schema on every read and write:
//! - typed fields live in private slots; `set` checks castability first and a
//!   rejected value leaves the slot untouched
//! - object fields with a sub-schema hold a nested `Record`
//! - array fields are re-coerced on every read, so elements pushed through
//!   `list_mut` are checked before anyone sees them
//! - derived fields route through the spec's getter and setter
//! - undeclared keys are kept as plain values

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::catalog::{can_cast, cast_to_type};
use super::coerce::{child_path, coerce_array, coerce_nested, initial_value};
use super::errors::{FailureKind, InvalidAssignment};
use super::options::Options;
use super::types::{FieldSpec, FieldType, Schema};
use super::value::{Object, Value};

/// Outcome of [`Record::set`].
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// The (coerced) value was stored
    Stored,
    /// The value failed castability; the previous value is kept
    Rejected(InvalidAssignment),
    /// The value was handed to a derived field's setter
    Derived,
    /// Derived field without a setter; nothing happened
    Ignored,
}

impl Assignment {
    pub fn is_stored(&self) -> bool {
        matches!(self, Assignment::Stored | Assignment::Derived)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Assignment::Rejected(_))
    }
}

/// Storage behind a live accessor.
#[derive(Debug, Clone)]
enum Stored {
    Plain(Value),
    Record(Box<Record>),
    List(RefCell<Vec<Value>>),
}

#[derive(Debug, Clone)]
enum Slot {
    /// Enforced on every access
    Live(Stored),
    /// Coerced once at construction, plain afterwards
    Static(Value),
    /// Accessor pair from the spec, no storage
    Derived,
}

#[derive(Clone, Copy)]
enum SlotKind {
    Live,
    Static,
    Derived,
    Loose,
}

/// An object instrumented with a schema.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    options: Options,
    path: String,
    slots: BTreeMap<String, Slot>,
    loose: Object,
}

impl Record {
    /// Instruments `object` with a normalized schema.
    ///
    /// Typed fields are installed first, then derived fields; a value the
    /// object already held for a derived field is replayed through its setter.
    pub fn construct(object: Object, schema: Arc<Schema>, options: Options) -> Self {
        Self::construct_at(object, schema, options, String::new())
    }

    fn construct_at(object: Object, schema: Arc<Schema>, options: Options, path: String) -> Self {
        let mut record = Self {
            schema: Arc::clone(&schema),
            options,
            path,
            slots: BTreeMap::new(),
            loose: object,
        };

        for (name, spec) in schema.fields().filter(|(_, spec)| !spec.is_derived()) {
            let Some(field_type) = &spec.field_type else { continue };

            let field_path = child_path(&record.path, name);
            let existing = record.loose.remove(name);
            let value = initial_value(
                existing,
                field_type,
                spec.default.as_ref(),
                &field_path,
                &record.options,
            );

            let slot = if record.options.is_static_by_default() && !spec.dynamic {
                Slot::Static(coerce_nested(value, spec, &field_path, &record.options))
            } else {
                Slot::Live(Stored::new(value, spec, field_path, &record.options))
            };
            record.slots.insert(name.to_string(), slot);
        }

        let mut replays = Vec::new();
        for (name, _) in schema.fields().filter(|(_, spec)| spec.is_derived()) {
            if let Some(existing) = record.loose.remove(name) {
                replays.push((name.to_string(), existing));
            }
            record.slots.insert(name.to_string(), Slot::Derived);
        }
        for (name, value) in replays {
            record.set(&name, value);
        }

        record.options.record_instrumented(&record.path, record.slots.len());
        record
    }

    /// The schema this record enforces
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Reads a field. Array fields are re-coerced first; derived fields call
    /// their getter. Returns `None` for unknown keys and getter-less fields.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.slots.get(key) {
            Some(Slot::Live(stored)) => Some(self.read(key, stored)),
            Some(Slot::Static(value)) => Some(value.clone()),
            Some(Slot::Derived) => {
                let get = self.schema.field(key)?.get.clone()?;
                Some(get(self))
            }
            None => self.loose.get(key).cloned(),
        }
    }

    /// Writes a field.
    ///
    /// Typed fields only accept castable values; anything else is reported and
    /// the stored value stays as it was. Static and undeclared fields store the
    /// value as is.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Assignment {
        let value = value.into();
        match self.slot_kind(key) {
            SlotKind::Live => self.assign(key, value),
            SlotKind::Static => {
                self.slots.insert(key.to_string(), Slot::Static(value));
                Assignment::Stored
            }
            SlotKind::Derived => {
                let set = self.schema.field(key).and_then(|spec| spec.set.clone());
                match set {
                    Some(set) => {
                        set(self, value);
                        Assignment::Derived
                    }
                    None => Assignment::Ignored,
                }
            }
            SlotKind::Loose => {
                self.loose.insert(key.to_string(), value);
                Assignment::Stored
            }
        }
    }

    /// Nested record of an object field with a sub-schema.
    pub fn record(&self, key: &str) -> Option<&Record> {
        match self.slots.get(key) {
            Some(Slot::Live(Stored::Record(record))) => Some(record),
            _ => None,
        }
    }

    /// Mutable nested record; writes through it are coerced by the sub-schema.
    pub fn record_mut(&mut self, key: &str) -> Option<&mut Record> {
        match self.slots.get_mut(key) {
            Some(Slot::Live(Stored::Record(record))) => Some(record),
            _ => None,
        }
    }

    /// Raw access to an array field's items, unchecked until the next read.
    pub fn list_mut(&mut self, key: &str) -> Option<&mut Vec<Value>> {
        match self.slots.get_mut(key) {
            Some(Slot::Live(Stored::List(items))) => Some(items.get_mut()),
            Some(Slot::Live(Stored::Plain(Value::Array(items))))
            | Some(Slot::Static(Value::Array(items))) => Some(items),
            Some(_) => None,
            None => match self.loose.get_mut(key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            },
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key) || self.loose.contains_key(key)
    }

    /// Enumerable keys: declared fields marked enumerable plus undeclared keys.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .slots
            .keys()
            .filter(|key| self.is_enumerable(key))
            .map(String::as_str)
            .chain(self.loose.keys().map(String::as_str))
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Snapshot of every enumerable field as a plain object.
    pub fn to_object(&self) -> Object {
        self.keys()
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_object())
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.to_value().to_json()
    }

    fn is_enumerable(&self, key: &str) -> bool {
        self.schema.field(key).map_or(true, |spec| spec.enumerable)
    }

    fn slot_kind(&self, key: &str) -> SlotKind {
        match self.slots.get(key) {
            Some(Slot::Live(_)) => SlotKind::Live,
            Some(Slot::Static(_)) => SlotKind::Static,
            Some(Slot::Derived) => SlotKind::Derived,
            None => SlotKind::Loose,
        }
    }

    fn read(&self, key: &str, stored: &Stored) -> Value {
        match stored {
            Stored::Plain(value) => value.clone(),
            Stored::Record(record) => record.to_value(),
            Stored::List(cell) => {
                let mut items = cell.borrow_mut();
                let element = self.schema.field(key).and_then(FieldSpec::element);
                coerce_array(&mut items, element, &child_path(&self.path, key), &self.options);
                Value::Array(items.clone())
            }
        }
    }

    fn assign(&mut self, key: &str, value: Value) -> Assignment {
        let schema = Arc::clone(&self.schema);
        let Some(spec) = schema.field(key) else {
            return Assignment::Ignored;
        };
        let Some(field_type) = &spec.field_type else {
            return Assignment::Ignored;
        };

        let field_path = child_path(&self.path, key);
        if !can_cast(&value, field_type) {
            let failure = InvalidAssignment::new(
                field_path,
                value,
                field_type.clone(),
                FailureKind::Assignment,
            );
            self.options.report(&failure);
            return Assignment::Rejected(failure);
        }

        let cast = cast_to_type(value, field_type);
        let stored = Stored::new(cast, spec, field_path.clone(), &self.options);
        self.slots.insert(key.to_string(), Slot::Live(stored));
        self.options.record_accepted(&field_path);
        Assignment::Stored
    }
}

impl Stored {
    /// Wraps a cast value, instrumenting nested schemas.
    fn new(value: Value, spec: &FieldSpec, path: String, options: &Options) -> Self {
        match (value, spec.fields()) {
            (Value::Object(object), Some(schema)) => Stored::Record(Box::new(Record::construct_at(
                object,
                Arc::clone(schema),
                options.clone(),
                path,
            ))),
            (Value::Array(mut items), _) if spec.field_type == Some(FieldType::Array) => {
                coerce_array(&mut items, spec.element(), &path, options);
                Stored::List(RefCell::new(items))
            }
            (value, _) => Stored::Plain(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::decl::{FieldDecl, SchemaDecl, SpecDecl};
    use crate::schema::normalizer::normalize_shared;
    use crate::schema::options::RejectionLog;
    use crate::schema::value::Pattern;
    use serde_json::json;

    fn object(json: serde_json::Value) -> Object {
        match Value::from(json) {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other.type_name()),
        }
    }

    fn counter_schema() -> Arc<Schema> {
        normalize_shared(
            SchemaDecl::new()
                .field("id", FieldType::String)
                .field("count", FieldType::Number),
        )
    }

    #[test]
    fn test_number_field_rejects_then_accepts() {
        let mut record = Record::construct(
            object(json!({"id": "test", "count": 5})),
            counter_schema(),
            Options::new(),
        );

        let outcome = record.set("count", "seven");
        assert!(outcome.is_rejected());
        assert_eq!(record.get("count"), Some(Value::Number(5.0)));

        assert!(record.set("count", "7").is_stored());
        assert_eq!(record.get("count"), Some(Value::Number(7.0)));
    }

    #[test]
    fn test_missing_fields_get_catalog_defaults() {
        let record = Record::construct(Object::new(), counter_schema(), Options::new());
        assert_eq!(record.get("id"), Some(Value::from("")));
        assert_eq!(record.get("count"), Some(Value::Number(0.0)));
    }

    #[test]
    fn test_rejection_reported_once() {
        let log = Arc::new(RejectionLog::new());
        let mut record = Record::construct(
            Object::new(),
            counter_schema(),
            Options::new().with_observer(log.clone()),
        );
        record.set("count", "x");
        let failures = log.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, "count");
        assert_eq!(failures[0].kind, FailureKind::Assignment);
    }

    #[test]
    fn test_undeclared_keys_are_plain() {
        let mut record = Record::construct(
            object(json!({"extra": [1, 2]})),
            counter_schema(),
            Options::new(),
        );
        assert_eq!(record.set("other", "anything"), Assignment::Stored);
        assert_eq!(record.get("other"), Some(Value::from("anything")));
        record.list_mut("extra").unwrap().push("x".into());
        assert_eq!(record.get("extra").unwrap().as_array().unwrap().len(), 3);
        assert_eq!(record.keys(), vec!["count", "extra", "id", "other"]);
    }

    #[test]
    fn test_nested_record_path_in_failures() {
        let log = Arc::new(RejectionLog::new());
        let schema = normalize_shared(
            SchemaDecl::new().field("address", SchemaDecl::new().field("zip", FieldType::Number)),
        );
        let mut record = Record::construct(
            Object::new(),
            schema,
            Options::new().with_observer(log.clone()),
        );
        record.record_mut("address").unwrap().set("zip", "abc");
        assert_eq!(log.failures()[0].field, "address.zip");
    }

    #[test]
    fn test_array_reads_recoerce() {
        let schema = normalize_shared(SchemaDecl::new().field("tags", FieldDecl::array_of(FieldType::Number)));
        let mut record = Record::construct(object(json!({"tags": [1, "2"]})), schema, Options::new());

        let tags = record.list_mut("tags").unwrap();
        tags.push("3".into());
        tags.push("three".into());

        assert_eq!(
            record.get("tags"),
            Some(Value::Array(vec![1.into(), 2.into(), 3.into()]))
        );
    }

    #[test]
    fn test_non_enumerable_hidden_from_keys() {
        let schema = normalize_shared(
            SchemaDecl::new()
                .field("visible", FieldType::String)
                .field("secret", SpecDecl::new(FieldType::String).enumerable(false)),
        );
        let record = Record::construct(object(json!({"secret": "s"})), schema, Options::new());
        assert_eq!(record.keys(), vec!["visible"]);
        assert_eq!(record.get("secret"), Some(Value::from("s")));
        assert!(!record.to_object().contains_key("secret"));
    }

    #[test]
    fn test_pattern_field() {
        let schema = normalize_shared(
            SchemaDecl::new().field("zip", Pattern::new(r"^\d{5}$").unwrap()),
        );
        let mut record = Record::construct(Object::new(), schema, Options::new());
        assert!(record.set("zip", 10001).is_stored());
        assert_eq!(record.get("zip"), Some(Value::from("10001")));
        assert!(record.set("zip", "1234").is_rejected());
        assert_eq!(record.get("zip"), Some(Value::from("10001")));
    }

    #[test]
    fn test_untyped_explicit_spec_is_left_alone() {
        let schema = normalize_shared(SchemaDecl::new().field("note", SpecDecl::untyped().index(true)));
        let mut record = Record::construct(object(json!({"note": 1})), schema, Options::new());
        assert_eq!(record.get("note"), Some(Value::Number(1.0)));
        record.set("note", "text");
        assert_eq!(record.get("note"), Some(Value::from("text")));
    }
}
