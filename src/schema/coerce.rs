//! One-shot coercion
//!
//! Applies the construction-time rules once and returns plain values:
//! - arrays: walk from the end, coerce castable elements, drop the rest
//! - objects: pick each field's initial value by priority
//!   (existing value, then declared default, then catalog default)
//!
//! Live records reuse these for their initial values and for the array pass
//! that runs on every read.

use super::catalog::{can_cast, cast_to_type, default_value};
use super::errors::{FailureKind, InvalidAssignment};
use super::options::Options;
use super::types::{FieldSpec, FieldType, Schema};
use super::value::{Object, Value};

/// Coerces `items` in place against the element spec.
///
/// Castable elements are converted, the rest are removed and reported. An
/// element spec without a type leaves the array untouched.
pub fn coerce_array(items: &mut Vec<Value>, element: Option<&FieldSpec>, path: &str, options: &Options) {
    let Some(element) = element else { return };
    let Some(field_type) = &element.field_type else { return };

    // Back to front so removals never skip an element
    let mut index = items.len();
    while index > 0 {
        index -= 1;
        let item = std::mem::take(&mut items[index]);
        let item_path = format!("{}[{}]", path, index);

        if can_cast(&item, field_type) {
            let cast = cast_to_type(item, field_type);
            items[index] = coerce_nested(cast, element, &item_path, options);
        } else {
            items.remove(index);
            options.report(&InvalidAssignment::new(
                item_path,
                item,
                field_type.clone(),
                FailureKind::ArrayElement,
            ));
        }
    }
}

/// Coerces every declared field of `object` once. Derived and untyped fields
/// are left as they are.
pub fn coerce_object(mut object: Object, schema: &Schema, path: &str, options: &Options) -> Object {
    for (name, spec) in schema.fields() {
        if spec.is_derived() {
            continue;
        }
        let Some(field_type) = &spec.field_type else { continue };

        let field_path = child_path(path, name);
        let existing = object.remove(name);
        let value = initial_value(existing, field_type, spec.default.as_ref(), &field_path, options);
        object.insert(name.to_string(), coerce_nested(value, spec, &field_path, options));
    }
    object
}

/// Coerces a single value against a field spec once.
///
/// An uncastable value is reported and replaced by the spec's default (or
/// the catalog default). Untyped and derived specs return the value as is.
pub fn coerce_value(value: Value, spec: &FieldSpec, path: &str, options: &Options) -> Value {
    if spec.is_derived() {
        return value;
    }
    let Some(field_type) = &spec.field_type else { return value };
    let value = initial_value(Some(value), field_type, spec.default.as_ref(), path, options);
    coerce_nested(value, spec, path, options)
}

/// Applies a field's nested schema to an already-cast value.
pub fn coerce_nested(value: Value, spec: &FieldSpec, path: &str, options: &Options) -> Value {
    match value {
        Value::Object(object) => match spec.fields() {
            Some(schema) => Value::Object(coerce_object(object, schema, path, options)),
            None => Value::Object(object),
        },
        Value::Array(mut items) => {
            if spec.field_type == Some(FieldType::Array) {
                coerce_array(&mut items, spec.element(), path, options);
            }
            Value::Array(items)
        }
        other => other,
    }
}

/// Chooses a field's initial value:
/// 1. the existing value, if castable
/// 2. the declared default, if castable
/// 3. the catalog default for the type
pub(crate) fn initial_value(
    existing: Option<Value>,
    field_type: &FieldType,
    default: Option<&Value>,
    path: &str,
    options: &Options,
) -> Value {
    if let Some(value) = existing {
        if can_cast(&value, field_type) {
            return cast_to_type(value, field_type);
        }
        if value != Value::Undefined {
            options.report(&InvalidAssignment::new(
                path,
                value,
                field_type.clone(),
                FailureKind::ExistingValue,
            ));
        }
    }

    if let Some(default) = default {
        if can_cast(default, field_type) {
            return cast_to_type(default.clone(), field_type);
        }
        options.report(&InvalidAssignment::new(
            path,
            default.clone(),
            field_type.clone(),
            FailureKind::Default,
        ));
    }

    default_value(field_type)
}

/// Creates a field path from prefix and field name.
pub(crate) fn child_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::options::RejectionLog;
    use crate::schema::value::Pattern;
    use serde_json::json;
    use std::sync::Arc;

    fn logged() -> (Arc<RejectionLog>, Options) {
        let log = Arc::new(RejectionLog::new());
        let options = Options::new().with_observer(log.clone());
        (log, options)
    }

    #[test]
    fn test_array_coercion_drops_uncastable() {
        let (log, options) = logged();
        let mut items: Vec<Value> = vec![1.into(), "2".into(), "three".into(), 4.into()];
        coerce_array(&mut items, Some(&FieldSpec::of(FieldType::Number)), "nums", &options);

        assert_eq!(items, vec![Value::Number(1.0), Value::Number(2.0), Value::Number(4.0)]);
        let failures = log.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].value, Value::from("three"));
        assert_eq!(failures[0].field, "nums[2]");
        assert_eq!(failures[0].kind, FailureKind::ArrayElement);
    }

    #[test]
    fn test_array_coercion_adjacent_removals() {
        let (_, options) = logged();
        let mut items: Vec<Value> = vec!["a".into(), "b".into(), 1.into(), "c".into()];
        coerce_array(&mut items, Some(&FieldSpec::of(FieldType::Number)), "", &options);
        assert_eq!(items, vec![Value::Number(1.0)]);
    }

    #[test]
    fn test_array_without_element_type_untouched() {
        let (log, options) = logged();
        let mut items: Vec<Value> = vec![1.into(), "x".into()];
        coerce_array(&mut items, None, "", &options);
        assert_eq!(items.len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn test_array_of_objects_coerces_each_element() {
        let (_, options) = logged();
        let element = FieldSpec::object(
            Schema::default().with_field("qty", FieldSpec::of(FieldType::Number)),
        );
        let mut items = vec![Value::from(json!({"qty": "3"})), Value::from("not an object")];
        coerce_array(&mut items, Some(&element), "lines", &options);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_object().unwrap()["qty"], Value::Number(3.0));
    }

    #[test]
    fn test_object_priority_existing_then_default_then_catalog() {
        let (log, options) = logged();
        let schema = Schema::default()
            .with_field("a", FieldSpec::of(FieldType::Number).with_default(5))
            .with_field("b", FieldSpec::of(FieldType::Number).with_default("9"))
            .with_field("c", FieldSpec::of(FieldType::Number).with_default("nope"))
            .with_field("d", FieldSpec::of(FieldType::String));

        let object = match Value::from(json!({"a": "1", "extra": true})) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let out = coerce_object(object, &schema, "", &options);

        assert_eq!(out["a"], Value::Number(1.0));
        assert_eq!(out["b"], Value::Number(9.0));
        assert_eq!(out["c"], Value::Number(0.0));
        assert_eq!(out["d"], Value::from(""));
        assert_eq!(out["extra"], Value::Bool(true));

        let failures = log.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::Default);
        assert_eq!(failures[0].value, Value::from("nope"));
    }

    #[test]
    fn test_existing_uncastable_value_reported() {
        let (log, options) = logged();
        let value = initial_value(
            Some("abc".into()),
            &FieldType::Number,
            None,
            "count",
            &options,
        );
        assert_eq!(value, Value::Number(0.0));
        assert_eq!(log.failures()[0].kind, FailureKind::ExistingValue);
    }

    #[test]
    fn test_pattern_default_is_empty_text() {
        let (_, options) = logged();
        let zip = FieldType::Pattern(Pattern::new(r"^\d{5}$").unwrap());
        assert_eq!(initial_value(None, &zip, None, "zip", &options), Value::from(""));
    }

    #[test]
    fn test_coerce_value_falls_back_to_default() {
        let (log, options) = logged();
        let spec = FieldSpec::of(FieldType::Number).with_default(3);
        assert_eq!(coerce_value("12".into(), &spec, "n", &options), Value::Number(12.0));
        assert_eq!(coerce_value("twelve".into(), &spec, "n", &options), Value::Number(3.0));
        assert_eq!(log.failures()[0].kind, FailureKind::ExistingValue);

        let untyped = FieldSpec::derived(None, None);
        assert_eq!(coerce_value("x".into(), &untyped, "n", &options), Value::from("x"));
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("", "a"), "a");
        assert_eq!(child_path("a", "b"), "a.b");
    }
}
