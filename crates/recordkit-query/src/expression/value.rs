//! Runtime values produced by formula evaluation.
//!
//! Formulas are authored against loosely typed form data, so [`Value`]
//! follows the coercion rules of the environment the formulas were written
//! for: anything can be tested for truthiness, turned into a number, or
//! turned into a string. `Undefined` and `Null` are distinct; the first means
//! "no value was found", the second is an explicit null.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

/// A runtime value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum Value {
    /// No value (missing field, missing property).
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// An instant, compared by millisecond timestamp.
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Returns true for `Undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true for `Undefined` and `Null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true for values that behave like objects for property access.
    pub fn is_object_like(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_) | Value::Date(_))
    }

    /// Short name of the variant, for diagnostics.
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
        }
    }

    /// Truthiness: `undefined`, `null`, `false`, `0`, `NaN` and `""` are
    /// falsy, everything else is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Date(_) | Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Numeric coercion.
    ///
    /// Strings are trimmed; an empty string is `0`; anything that is not a
    /// complete decimal, hex, octal or binary literal is `NaN`. Dates become
    /// their millisecond timestamp. Arrays go through their string form.
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
            Value::String(s) => string_to_number(s),
            Value::Date(dt) => dt.timestamp_millis() as f64,
            Value::Array(_) => string_to_number(&self.to_js_string()),
            Value::Object(_) => f64::NAN,
        }
    }

    /// String coercion.
    ///
    /// Dates are rendered as RFC 3339 with millisecond precision. Arrays join
    /// their elements with `,`, rendering nullish elements as empty strings.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Date(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_js_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    /// Returns the instant this value denotes, if any.
    ///
    /// `Date` values are returned as-is. Strings qualify when they look like
    /// `YYYY-MM-DD`, optionally followed by a time separated by `T` or a space,
    /// and describe a valid instant.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(dt) => Some(*dt),
            Value::String(s) => parse_date_like(s),
            _ => None,
        }
    }

    /// Returns the string slice for `String` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up a property the way member access does on objects.
    ///
    /// Objects return the named entry, arrays expose `length` and numeric
    /// indexes. Missing properties and dates yield `Undefined`. Returns `None`
    /// for values that are not object-like.
    pub fn property(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(map) => Some(map.get(name).cloned().unwrap_or_default()),
            Value::Array(items) => {
                if name == "length" {
                    return Some(Value::Number(items.len() as f64));
                }
                let element = name.parse::<usize>().ok().and_then(|index| items.get(index));
                Some(element.cloned().unwrap_or_default())
            }
            Value::Date(_) => Some(Value::Undefined),
            _ => None,
        }
    }
}

/// Parses strings shaped like `YYYY-MM-DD[( |T)HH:MM[:SS[.fff]][offset]]`.
///
/// A bare date is UTC midnight. A date-time without offset is local time.
pub(crate) fn parse_date_like(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if !has_date_prefix(s) {
        return None;
    }

    let (date_part, rest) = s.split_at(10);
    if rest.is_empty() {
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    if !rest.starts_with('T') && !rest.starts_with(' ') {
        return None;
    }
    let normalized = format!("{}T{}", date_part, &rest[1..]);

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

fn has_date_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 10 {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    digits(0..4) && bytes[4] == b'-' && digits(5..7) && bytes[7] == b'-' && digits(8..10)
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix_prefixes = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)];
    for (prefix, radix) in radix_prefixes {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // Rust accepts "inf" and "nan" spellings that are not numeric literals here.
    if trimmed
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

// ==================== Conversions ====================

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Undefined | Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Number(n) => number_to_json(n),
            Value::String(s) => JsonValue::String(s),
            Value::Date(dt) => JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Array(items) => JsonValue::Array(items.into_iter().map(JsonValue::from).collect()),
            Value::Object(map) => JsonValue::Object(map.into_iter().map(|(k, v)| (k, JsonValue::from(v))).collect()),
        }
    }
}

/// Integral values are emitted without a fraction; non-finite values become null.
fn number_to_json(n: f64) -> JsonValue {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if n == n.trunc() && n.abs() <= MAX_SAFE_INTEGER {
        return JsonValue::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(JsonValue::Number).unwrap_or(JsonValue::Null)
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

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
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

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::Date(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.truthy());
        assert!(!Value::Null.truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(!Value::from("").truthy());
        assert!(Value::from("0").truthy());
        assert!(Value::Array(vec![]).truthy());
        assert!(Value::Object(BTreeMap::new()).truthy());
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(Value::from("42").to_number(), 42.0);
        assert_eq!(Value::from("  3.5 ").to_number(), 3.5);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert_eq!(Value::from("1e3").to_number(), 1000.0);
        assert_eq!(Value::from("0x1A").to_number(), 26.0);
        assert_eq!(Value::from("-Infinity").to_number(), f64::NEG_INFINITY);
        assert!(Value::from("abc").to_number().is_nan());
        assert!(Value::from("inf").to_number().is_nan());
        assert!(Value::from("NaN").to_number().is_nan());
        assert!(Value::from("12px").to_number().is_nan());
    }

    #[test]
    fn test_other_to_number() {
        assert!(Value::Undefined.to_number().is_nan());
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::Array(vec![]).to_number(), 0.0);
        assert_eq!(Value::Array(vec![Value::from(7)]).to_number(), 7.0);
        assert!(Value::Array(vec![Value::from(1), Value::from(2)]).to_number().is_nan());
        assert!(Value::Object(BTreeMap::new()).to_number().is_nan());
    }

    #[test]
    fn test_to_js_string() {
        assert_eq!(Value::Number(3.0).to_js_string(), "3");
        assert_eq!(Value::Number(-0.5).to_js_string(), "-0.5");
        assert_eq!(Value::Number(f64::NAN).to_js_string(), "NaN");
        assert_eq!(Value::Bool(false).to_js_string(), "false");
        assert_eq!(
            Value::Array(vec![Value::from(1), Value::Null, Value::from("x")]).to_js_string(),
            "1,,x"
        );
        assert_eq!(Value::Object(BTreeMap::new()).to_js_string(), "[object Object]");
    }

    #[test]
    fn test_parse_bare_date_is_utc_midnight() {
        let dt = parse_date_like("2024-03-15").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-15T00:00:00+00:00");
    }

    #[test]
    fn test_parse_date_time_variants() {
        assert!(parse_date_like("2024-03-15T10:30").is_some());
        assert!(parse_date_like("2024-03-15 10:30:05").is_some());
        assert!(parse_date_like("2024-03-15T10:30:05.250").is_some());

        let with_offset = parse_date_like("2024-03-15T10:30:00+02:00").unwrap();
        assert_eq!(with_offset.hour(), 8);
        let zulu = parse_date_like("2024-03-15 10:30:00Z").unwrap();
        assert_eq!(zulu.hour(), 10);
    }

    #[test]
    fn test_parse_rejects_non_dates() {
        assert!(parse_date_like("abc").is_none());
        assert!(parse_date_like("5").is_none());
        assert!(parse_date_like("2024-1-5").is_none());
        assert!(parse_date_like("2024-02-30").is_none());
        assert!(parse_date_like("2024-03-15X10:00").is_none());
        assert!(parse_date_like("2024-03-15T25:00").is_none());
    }

    #[test]
    fn test_property_lookup() {
        let object = Value::from(json!({ "email": "a@b.c" }));
        assert_eq!(object.property("email"), Some(Value::from("a@b.c")));
        assert_eq!(object.property("phone"), Some(Value::Undefined));

        let array = Value::from(json!([10, 20]));
        assert_eq!(array.property("length"), Some(Value::Number(2.0)));
        assert_eq!(array.property("1"), Some(Value::Number(20.0)));
        assert_eq!(array.property("5"), Some(Value::Undefined));

        assert_eq!(Value::from("text").property("length"), None);
        assert_eq!(Value::Null.property("x"), None);
    }

    #[test]
    fn test_json_round_trip() {
        let json = json!({ "count": 3, "ratio": 0.25, "tags": ["a", null], "ok": true });
        let value = Value::from(json.clone());
        assert_eq!(JsonValue::from(value), json);
    }

    #[test]
    fn test_special_values_to_json() {
        assert_eq!(JsonValue::from(Value::Undefined), JsonValue::Null);
        assert_eq!(JsonValue::from(Value::Number(f64::NAN)), JsonValue::Null);
        let date = parse_date_like("2024-01-01").unwrap();
        assert_eq!(JsonValue::from(Value::Date(date)), json!("2024-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_deserialize_from_json() {
        let value: Value = serde_json::from_value(json!({ "name": "Ada" })).unwrap();
        assert_eq!(value.property("name"), Some(Value::from("Ada")));
    }
}
