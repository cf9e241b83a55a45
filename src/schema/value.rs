//! Dynamic values coerced by the engine
//!
//! The conversions here follow loose scripting-language rules:
//! - Textual representation of every value
//! - Numeric coercion (blank text is 0, unparsable text is NaN)
//! - Truthiness
//! - Date construction from numbers and text

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use regex::Regex;

/// Object storage: field name to value, deterministic key order.
pub type Object = BTreeMap<String, Value>;

/// A compiled regular expression that compares by its source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compiles a pattern from regex source.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
        })
    }

    /// The pattern that matches every input (`(?:)`).
    pub fn empty() -> Self {
        Self {
            regex: Regex::new("(?:)").expect("empty pattern is valid"),
        }
    }

    /// Returns the regex source
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    /// Tests whether the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source()
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self { regex }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source())
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value at all
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit float (the only numeric representation)
    Number(f64),
    /// UTF-8 text
    String(String),
    /// Point in time, millisecond precision
    Date(DateTime<Utc>),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Field mapping
    Object(Object),
    /// Regular expression
    Pattern(Pattern),
}

impl Value {
    /// Returns the runtime type name used for exact type matching.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Pattern(_) => "regexp",
        }
    }

    /// True for `Undefined` and `Null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the textual representation of the value.
    pub fn to_text(&self) -> String {
        match self {
            Value::Undefined => "undefined".into(),
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_text(*n),
            Value::String(s) => s.clone(),
            Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    // nullish elements render as empty
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_text()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".into(),
            Value::Pattern(p) => p.to_string(),
        }
    }

    /// Loose numeric coercion. Returns NaN when no number can be derived.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => text_to_number(s),
            Value::Date(d) => d.timestamp_millis() as f64,
            Value::Array(items) => match items.as_slice() {
                [] => 0.0,
                [single] => text_to_number(&single.to_text()),
                _ => f64::NAN,
            },
            Value::Object(_) | Value::Pattern(_) => f64::NAN,
        }
    }

    /// Loose truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Constructs a date from the value, `None` when the timestamp would be invalid.
    pub fn to_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Null => Utc.timestamp_millis_opt(0).single(),
            Value::Bool(b) => Utc.timestamp_millis_opt(i64::from(*b)).single(),
            Value::Number(n) => millis_to_date(*n),
            Value::String(s) => parse_date(s),
            Value::Array(_) => parse_date(&self.to_text()),
            Value::Undefined | Value::Object(_) | Value::Pattern(_) => None,
        }
    }

    /// Converts into a JSON value. Dates and patterns become strings, undefined becomes null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(|num| {
                    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
                        serde_json::Value::Number((*n as i64).into())
                    } else {
                        serde_json::Value::Number(num)
                    }
                })
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(_) | Value::Pattern(_) => serde_json::Value::String(self.to_text()),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => f.write_str(&other.to_text()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Value::Pattern(p)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Object> for Value {
    fn from(map: Object) -> Self {
        Value::Object(map)
    }
}

fn number_to_text(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.into()
    } else if n == 0.0 {
        // -0 prints as 0
        "0".into()
    } else {
        n.to_string()
    }
}

/// Parses a complete numeric literal, tolerating surrounding whitespace.
/// Blank text is 0; anything that is not entirely a number is NaN.
pub(crate) fn text_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Rust accepts "inf"/"nan" spellings that are not numeric literals here
    let literal = trimmed.trim_start_matches(['+', '-']);
    if !literal.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn millis_to_date(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis.trunc() as i64).single()
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(text) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = DateTime::parse_from_rfc2822(text) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_text_has_no_trailing_fraction() {
        assert_eq!(Value::Number(5.0).to_text(), "5");
        assert_eq!(Value::Number(7.25).to_text(), "7.25");
        assert_eq!(Value::Number(-0.0).to_text(), "0");
        assert_eq!(Value::Number(f64::NAN).to_text(), "NaN");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_text(), "-Infinity");
    }

    #[test]
    fn test_array_text_joins_elements() {
        let value = Value::Array(vec![1.into(), Value::Null, "x".into()]);
        assert_eq!(value.to_text(), "1,,x");
    }

    #[test]
    fn test_text_to_number() {
        assert_eq!(text_to_number(" 7 "), 7.0);
        assert_eq!(text_to_number(""), 0.0);
        assert_eq!(text_to_number("-2.5e2"), -250.0);
        assert!(text_to_number("7abc").is_nan());
        assert!(text_to_number("inf").is_nan());
        assert!(text_to_number("nan").is_nan());
        assert_eq!(text_to_number("Infinity"), f64::INFINITY);
    }

    #[test]
    fn test_to_number_coercions() {
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::Array(vec![]).to_number(), 0.0);
        assert_eq!(Value::Array(vec!["3".into()]).to_number(), 3.0);
        assert!(Value::Undefined.to_number().is_nan());
        assert!(Value::Object(Object::new()).to_number().is_nan());
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::String("0".into()).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn test_date_parsing() {
        let iso = Value::from("2024-03-01T12:30:00.000Z").to_date().unwrap();
        assert_eq!(iso.timestamp_millis(), 1_709_296_200_000);

        let day = Value::from("2024-03-01").to_date().unwrap();
        assert_eq!(day.timestamp_millis(), 1_709_251_200_000);

        assert_eq!(Value::Number(0.0).to_date().unwrap().timestamp_millis(), 0);
        assert!(Value::from("not a date").to_date().is_none());
        assert!(Value::Undefined.to_date().is_none());
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::from(json!({"a": [1, "b", null], "c": true}));
        let obj = value.as_object().unwrap();
        assert_eq!(obj["a"], Value::Array(vec![1.into(), "b".into(), Value::Null]));
        assert_eq!(value.to_json(), json!({"a": [1, "b", null], "c": true}));
    }

    #[test]
    fn test_pattern_equality_by_source() {
        assert_eq!(Pattern::new("^a+$").unwrap(), Pattern::new("^a+$").unwrap());
        assert_ne!(Pattern::new("^a+$").unwrap(), Pattern::new("^b+$").unwrap());
        assert_eq!(Pattern::new("^a$").unwrap().to_string(), "/^a$/");
    }
}
