//! Parameter bag values and the coercion rules the condition evaluator relies on.
//!
//! Comparison semantics mirror the loosely typed host the templates were
//! written for: `==` coerces, `===` does not, ordering falls back to numbers
//! unless both sides are strings, and compound values compare by identity.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A node of the runtime parameter bag.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// A missing key or an unresolvable path.
    #[default]
    Absent,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Map(HashMap<String, Value>),
}

pub(crate) static ABSENT: Value = Value::Absent;

impl Value {
    /// Build a `Value::Map` from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Name of the variant as it shows up in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "object",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Absent | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Map(_) => true,
        }
    }

    /// Step one segment into this value.
    ///
    /// Falsy values never have fields. Arrays and strings expose `length`
    /// and canonical numeric indices; everything else resolves to `Absent`.
    pub fn field(&self, key: &str) -> Cow<'_, Value> {
        if !self.is_truthy() {
            return Cow::Borrowed(&ABSENT);
        }
        match self {
            Value::Map(m) => Cow::Borrowed(m.get(key).unwrap_or(&ABSENT)),
            Value::Array(items) => {
                if key == "length" {
                    return Cow::Owned(Value::Number(items.len() as f64));
                }
                match parse_index(key) {
                    Some(i) => Cow::Borrowed(items.get(i).unwrap_or(&ABSENT)),
                    None => Cow::Borrowed(&ABSENT),
                }
            }
            Value::String(s) => {
                if key == "length" {
                    return Cow::Owned(Value::Number(s.encode_utf16().count() as f64));
                }
                match parse_index(key).and_then(|i| s.encode_utf16().nth(i)) {
                    Some(unit) => Cow::Owned(Value::String(String::from_utf16_lossy(&[unit]))),
                    None => Cow::Borrowed(&ABSENT),
                }
            }
            _ => Cow::Borrowed(&ABSENT),
        }
    }

    /// Resolve a dotted path such as `user.address.city`.
    pub fn lookup(&self, path: &str) -> Cow<'_, Value> {
        path.split('.').fold(Cow::Borrowed(self), |current, segment| match current {
            Cow::Borrowed(v) => v.field(segment),
            Cow::Owned(v) => Cow::Owned(v.field(segment).into_owned()),
        })
    }

    /// Identity equality: no coercion, compound values equal only themselves.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(_), Value::Array(_)) | (Value::Map(_), Value::Map(_)) => {
                std::ptr::eq(self, other)
            }
            _ => false,
        }
    }

    /// Coercive equality.
    pub fn loose_eq(&self, other: &Value) -> bool {
        use Value::*;
        if std::mem::discriminant(self) == std::mem::discriminant(other) {
            return self.strict_eq(other);
        }
        match (self, other) {
            (Absent | Null, Absent | Null) => true,
            (Absent | Null, _) | (_, Absent | Null) => false,
            (Number(a), String(b)) => *a == parse_number(b),
            (String(a), Number(b)) => parse_number(a) == *b,
            (Bool(_), _) => Number(self.to_number()).loose_eq(other),
            (_, Bool(_)) => self.loose_eq(&Number(other.to_number())),
            (Array(_) | Map(_), Number(_) | String(_)) => {
                String(self.to_string()).loose_eq(other)
            }
            (Number(_) | String(_), Array(_) | Map(_)) => {
                self.loose_eq(&String(other.to_string()))
            }
            _ => false,
        }
    }

    /// Relational ordering. `None` means the operands are not comparable
    /// (a NaN turned up), which makes every ordering operator false.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        let left = self.to_primitive();
        let right = other.to_primitive();
        if let (Value::String(a), Value::String(b)) = (left.as_ref(), right.as_ref()) {
            return Some(a.encode_utf16().cmp(b.encode_utf16()));
        }
        left.to_number().partial_cmp(&right.to_number())
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Absent => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(_) | Value::Map(_) => parse_number(&self.to_string()),
        }
    }

    fn to_primitive(&self) -> Cow<'_, Value> {
        match self {
            Value::Array(_) | Value::Map(_) => Cow::Owned(Value::String(self.to_string())),
            _ => Cow::Borrowed(self),
        }
    }
}

/// Textual form of a value, as substituted into `foreach` content.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    match item {
                        Value::Absent | Value::Null => {}
                        other => write!(f, "{other}")?,
                    }
                }
                Ok(())
            }
            Value::Map(_) => f.write_str("[object Object]"),
        }
    }
}

/// Parse a numeric token: decimal, exponent, `0x`/`0o`/`0b` integers and
/// `Infinity`. Blank text is zero; anything else is NaN.
pub(crate) fn parse_number(text: &str) -> f64 {
    let s = text.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            return digits.chars().fold(0.0, |acc, c| {
                acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
            });
        }
    }
    // f64::from_str also takes `inf`, `infinity` and `nan` in any case.
    if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_index(key: &str) -> Option<usize> {
    let index = key.parse::<usize>().ok()?;
    (index.to_string() == key).then_some(index)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        return text.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{n}");
    }
    let exp = format!("{n:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value::from(json.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_walks_nested_maps() {
        let bag = Value::from(json!({"user": {"address": {"city": "Oslo"}}}));
        assert_eq!(bag.lookup("user.address.city").as_ref(), &Value::from("Oslo"));
        assert!(bag.lookup("user.phone").is_absent());
        assert!(bag.lookup("user.address.city.zip").is_absent());
    }

    #[test]
    fn lookup_through_falsy_values_is_absent() {
        let bag = Value::from(json!({"a": null, "b": 0, "c": "", "d": false}));
        for path in ["a.x", "b.x", "c.length", "d.x"] {
            assert!(bag.lookup(path).is_absent(), "{path}");
        }
    }

    #[test]
    fn lookup_array_index_and_length() {
        let bag = Value::from(json!({"ids": [10, 20], "name": "abc"}));
        assert_eq!(bag.lookup("ids.1").as_ref(), &Value::Number(20.0));
        assert_eq!(bag.lookup("ids.length").as_ref(), &Value::Number(2.0));
        assert_eq!(bag.lookup("name.length").as_ref(), &Value::Number(3.0));
        assert_eq!(bag.lookup("name.0").as_ref(), &Value::from("a"));
        assert!(bag.lookup("ids.01").is_absent());
        assert!(bag.lookup("ids.5").is_absent());
    }

    #[test]
    fn strict_equality_does_not_coerce() {
        assert!(Value::Number(1.0).strict_eq(&Value::Number(1.0)));
        assert!(!Value::from("1").strict_eq(&Value::Number(1.0)));
        assert!(!Value::Null.strict_eq(&Value::Absent));
        assert!(!Value::Absent.strict_eq(&Value::Null));
        assert!(!Value::Null.strict_eq(&Value::Number(0.0)));
        assert!(!Value::Number(f64::NAN).strict_eq(&Value::Number(f64::NAN)));
    }

    #[test]
    fn compound_values_compare_by_identity() {
        let a = Value::from(json!([1, 2]));
        let b = a.clone();
        assert!(a.strict_eq(&a));
        assert!(!a.strict_eq(&b));
        assert!(!a.loose_eq(&b));
    }

    #[test]
    fn loose_equality_coerces() {
        assert!(Value::from("1").loose_eq(&Value::Number(1.0)));
        assert!(Value::Null.loose_eq(&Value::Absent));
        assert!(!Value::Null.loose_eq(&Value::Number(0.0)));
        assert!(Value::Bool(true).loose_eq(&Value::Number(1.0)));
        assert!(Value::Bool(false).loose_eq(&Value::from("")));
        assert!(Value::from(json!([5])).loose_eq(&Value::Number(5.0)));
        assert!(Value::from(json!([1, 2])).loose_eq(&Value::from("1,2")));
    }

    #[test]
    fn ordering_numbers_strings_and_nan() {
        assert_eq!(Value::Number(2.0).compare(&Value::Number(10.0)), Some(Ordering::Less));
        assert_eq!(Value::from("2").compare(&Value::from("10")), Some(Ordering::Greater));
        assert_eq!(Value::from("2").compare(&Value::Number(10.0)), Some(Ordering::Less));
        assert_eq!(Value::Null.compare(&Value::Number(0.0)), Some(Ordering::Equal));
        assert_eq!(Value::Absent.compare(&Value::Number(0.0)), None);
        assert_eq!(Value::from("abc").compare(&Value::Number(1.0)), None);
    }

    #[test]
    fn parse_number_follows_numeric_literal_rules() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number("-1.5e3"), -1500.0);
        assert_eq!(parse_number("0x1F"), 31.0);
        assert_eq!(parse_number("0x10000000000000000"), 18446744073709551616.0);
        assert_eq!(parse_number("0b101"), 5.0);
        assert_eq!(parse_number("  "), 0.0);
        assert_eq!(parse_number("Infinity"), f64::INFINITY);
        assert!(parse_number("inf").is_nan());
        assert!(parse_number("NaN").is_nan());
        assert!(parse_number("0x").is_nan());
        assert!(parse_number("12abc").is_nan());
    }

    #[test]
    fn display_matches_textual_form() {
        assert_eq!(Value::Number(1.0).to_string(), "1");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(1e21).to_string(), "1e+21");
        assert_eq!(Value::Number(1e-7).to_string(), "1e-7");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Absent.to_string(), "undefined");
        assert_eq!(Value::from(json!([1, null, "x"])).to_string(), "1,,x");
        assert_eq!(Value::from(json!({"a": 1})).to_string(), "[object Object]");
    }
}
