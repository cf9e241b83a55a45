//! Type catalog: shorthand mapping, castability, conversion and defaults.
//!
//! `can_cast` is side-effect free so callers can check, report, and only then
//! mutate. `cast_to_type` must only be called after `can_cast` returned true
//! for the same arguments.

use chrono::Utc;

use super::types::FieldType;
use super::value::{text_to_number, Object, Pattern, Value};

/// Maps a textual type tag, including constructor-style names, to its
/// canonical type. Unknown tags pass through as [`FieldType::Other`].
pub fn map_shorthand(tag: &str) -> FieldType {
    match tag {
        "string" | "String" => FieldType::String,
        "number" | "Number" => FieldType::Number,
        "boolean" | "Boolean" => FieldType::Boolean,
        "date" | "Date" => FieldType::Date,
        "array" | "Array" => FieldType::Array,
        "object" | "Object" => FieldType::Object,
        "mixed" => FieldType::Mixed,
        "regexp" | "RegExp" => FieldType::RegExp,
        other => FieldType::Other(other.to_string()),
    }
}

/// Returns true when `value` can be converted to `field_type`.
pub fn can_cast(value: &Value, field_type: &FieldType) -> bool {
    match field_type {
        FieldType::Mixed | FieldType::Any => return true,
        FieldType::Array => return matches!(value, Value::Array(_)),
        _ => {}
    }

    if is_exact_match(value, field_type) {
        return true;
    }

    match field_type {
        FieldType::String => !value.is_nullish(),
        FieldType::Number => parses_to_finite(value),
        // Loose on purpose: anything that is not NaN numerically is accepted,
        // so "0" and "1" pass while "true" and "false" do not.
        FieldType::Boolean => !value.to_number().is_nan(),
        FieldType::Date => value.to_date().is_some(),
        FieldType::Pattern(pattern) => !value.is_nullish() && pattern.is_match(&value.to_text()),
        _ => false,
    }
}

/// Converts `value` to `field_type`.
pub fn cast_to_type(value: Value, field_type: &FieldType) -> Value {
    match field_type {
        FieldType::Mixed | FieldType::Any | FieldType::Array => return value,
        _ => {}
    }

    if is_exact_match(&value, field_type) {
        return value;
    }

    match field_type {
        FieldType::String => Value::String(value.to_text()),
        FieldType::Number => Value::Number(text_to_number(&value.to_text())),
        FieldType::Boolean => Value::Bool(value.is_truthy()),
        FieldType::Date => value.to_date().map(Value::Date).unwrap_or(Value::Undefined),
        FieldType::Pattern(_) => Value::String(value.to_text()),
        _ => value,
    }
}

/// Returns the catalog default for a type. Unrecognized types have none.
pub fn default_value(field_type: &FieldType) -> Value {
    match field_type {
        FieldType::String | FieldType::Pattern(_) => Value::String(String::new()),
        FieldType::Number => Value::Number(0.0),
        FieldType::Boolean => Value::Bool(false),
        FieldType::Date => Value::Date(Utc::now()),
        FieldType::RegExp => Value::Pattern(Pattern::empty()),
        FieldType::Array => Value::Array(Vec::new()),
        FieldType::Object => Value::Object(Object::new()),
        FieldType::Mixed | FieldType::Any | FieldType::Other(_) => Value::Undefined,
    }
}

/// Runtime type name equals the declared tag; NaN never counts as a number.
fn is_exact_match(value: &Value, field_type: &FieldType) -> bool {
    if let Value::Number(n) = value {
        if n.is_nan() {
            return false;
        }
    }
    match field_type {
        FieldType::Pattern(_) | FieldType::Mixed | FieldType::Any => false,
        other => value.type_name() == other.type_name(),
    }
}

fn parses_to_finite(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_finite(),
        Value::String(_) | Value::Array(_) => {
            let text = value.to_text();
            !text.trim().is_empty() && text_to_number(&text).is_finite()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pattern(source: &str) -> FieldType {
        FieldType::Pattern(Pattern::new(source).unwrap())
    }

    #[test]
    fn test_map_shorthand_constructor_names() {
        assert_eq!(map_shorthand("String"), FieldType::String);
        assert_eq!(map_shorthand("number"), FieldType::Number);
        assert_eq!(map_shorthand("Date"), FieldType::Date);
        assert_eq!(map_shorthand("Array"), FieldType::Array);
        assert_eq!(map_shorthand("id"), FieldType::Other("id".into()));
    }

    #[test]
    fn test_mixed_and_any_accept_everything() {
        for value in [Value::Undefined, Value::Null, 1.into(), "x".into()] {
            assert!(can_cast(&value, &FieldType::Mixed));
            assert!(can_cast(&value, &FieldType::Any));
            assert_eq!(cast_to_type(value.clone(), &FieldType::Any), value);
        }
    }

    #[test]
    fn test_array_requires_sequence() {
        assert!(can_cast(&Value::Array(vec![]), &FieldType::Array));
        assert!(!can_cast(&"a,b".into(), &FieldType::Array));
        assert!(!can_cast(&Value::Object(Object::new()), &FieldType::Array));
    }

    #[test]
    fn test_string_castability() {
        assert!(can_cast(&5.into(), &FieldType::String));
        assert!(can_cast(&false.into(), &FieldType::String));
        assert!(!can_cast(&Value::Null, &FieldType::String));
        assert!(!can_cast(&Value::Undefined, &FieldType::String));
        assert_eq!(cast_to_type(5.into(), &FieldType::String), Value::from("5"));
        assert_eq!(cast_to_type("x".into(), &FieldType::String), Value::from("x"));
    }

    #[test]
    fn test_number_castability() {
        assert!(can_cast(&7.into(), &FieldType::Number));
        assert!(can_cast(&"7".into(), &FieldType::Number));
        assert!(can_cast(&" 2.5 ".into(), &FieldType::Number));
        assert!(!can_cast(&"seven".into(), &FieldType::Number));
        assert!(!can_cast(&"".into(), &FieldType::Number));
        assert!(!can_cast(&"Infinity".into(), &FieldType::Number));
        assert!(!can_cast(&Value::Number(f64::NAN), &FieldType::Number));
        assert!(!can_cast(&true.into(), &FieldType::Number));
        assert!(!can_cast(&Value::Null, &FieldType::Number));
        assert_eq!(cast_to_type("7".into(), &FieldType::Number), Value::Number(7.0));
        assert_eq!(cast_to_type(" 2.5 ".into(), &FieldType::Number), Value::Number(2.5));
    }

    #[test]
    fn test_boolean_castability_is_numeric_quirk() {
        // Numeric-looking values pass, including "0", which casts to true
        assert!(can_cast(&"0".into(), &FieldType::Boolean));
        assert_eq!(cast_to_type("0".into(), &FieldType::Boolean), Value::Bool(true));
        assert!(can_cast(&0.into(), &FieldType::Boolean));
        assert_eq!(cast_to_type(0.into(), &FieldType::Boolean), Value::Bool(false));
        assert!(can_cast(&"".into(), &FieldType::Boolean));
        assert_eq!(cast_to_type("".into(), &FieldType::Boolean), Value::Bool(false));
        assert!(can_cast(&Value::Null, &FieldType::Boolean));

        // Words do not, not even "true"
        assert!(!can_cast(&"true".into(), &FieldType::Boolean));
        assert!(!can_cast(&"false".into(), &FieldType::Boolean));
        assert!(!can_cast(&Value::Undefined, &FieldType::Boolean));
        assert!(can_cast(&true.into(), &FieldType::Boolean));
    }

    #[test]
    fn test_date_castability() {
        let iso = "2024-03-01T12:30:00.000Z";
        assert!(can_cast(&iso.into(), &FieldType::Date));
        assert!(can_cast(&0.into(), &FieldType::Date));
        assert!(!can_cast(&"yesterday".into(), &FieldType::Date));
        let cast = cast_to_type(iso.into(), &FieldType::Date);
        assert_eq!(cast.as_date().unwrap().timestamp_millis(), 1_709_296_200_000);
    }

    #[test]
    fn test_pattern_castability() {
        let zip = pattern(r"^\d{5}$");
        assert!(can_cast(&"10001".into(), &zip));
        assert!(can_cast(&10001.into(), &zip));
        assert!(!can_cast(&"1000".into(), &zip));
        assert!(!can_cast(&Value::Null, &zip));
        assert_eq!(cast_to_type(10001.into(), &zip), Value::from("10001"));
    }

    #[test]
    fn test_object_requires_exact_match() {
        let obj = Value::from(json!({"a": 1}));
        assert!(can_cast(&obj, &FieldType::Object));
        assert!(!can_cast(&Value::Null, &FieldType::Object));
        assert!(!can_cast(&Value::Array(vec![]), &FieldType::Object));
    }

    #[test]
    fn test_other_tag_matches_runtime_type_only() {
        assert!(!can_cast(&"x".into(), &FieldType::Other("id".into())));
        assert_eq!(default_value(&FieldType::Other("id".into())), Value::Undefined);
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_value(&FieldType::String), Value::from(""));
        assert_eq!(default_value(&FieldType::Number), Value::Number(0.0));
        assert_eq!(default_value(&FieldType::Boolean), Value::Bool(false));
        assert_eq!(default_value(&FieldType::Array), Value::Array(vec![]));
        assert_eq!(default_value(&FieldType::Object), Value::Object(Object::new()));
        assert_eq!(default_value(&pattern("^a$")), Value::from(""));
        assert_eq!(default_value(&FieldType::RegExp), Value::Pattern(Pattern::empty()));

        let before = Utc::now();
        let date = default_value(&FieldType::Date);
        assert!(*date.as_date().unwrap() >= before);
    }
}
