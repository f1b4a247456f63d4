//! Typed field values and literal coercion
//!
//! Filter constants arrive as bare strings. The compiler coerces each one to
//! the declared type of the field it is compared with, using the fixed table in
//! [`FieldType::coerce`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Declared type of an entity field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
        }
    }

    /// Coerce a filter literal to this type. Returns `None` if the literal is
    /// not a valid representation.
    pub fn coerce(&self, literal: &str) -> Option<Value> {
        match self {
            FieldType::Text => Some(Value::Text(literal.to_string())),
            FieldType::Integer => literal.trim().parse().ok().map(Value::Integer),
            FieldType::Float => literal
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float),
            FieldType::Boolean => parse_bool(literal).map(Value::Bool),
            FieldType::Date => parse_date(literal).map(Value::Date),
            FieldType::DateTime => parse_datetime(literal).map(Value::DateTime),
        }
    }

    /// Convert a JSON value from a dataset file to this type.
    pub fn from_json(&self, json: &serde_json::Value) -> Option<Value> {
        use serde_json::Value as Json;
        match (self, json) {
            (_, Json::Null) => Some(Value::Null),
            (FieldType::Integer, Json::Number(n)) => n.as_i64().map(Value::Integer),
            (FieldType::Float, Json::Number(n)) => n.as_f64().map(Value::Float),
            (FieldType::Boolean, Json::Bool(b)) => Some(Value::Bool(*b)),
            (FieldType::Text, Json::Number(n)) => Some(Value::Text(n.to_string())),
            (FieldType::Text, Json::Bool(b)) => Some(Value::Text(b.to_string())),
            (_, Json::String(s)) => self.coerce(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_bool(literal: &str) -> Option<bool> {
    match literal.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_date(literal: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(literal.trim(), DATE_FORMAT).ok()
}

fn parse_datetime(literal: &str) -> Option<NaiveDateTime> {
    let literal = literal.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(literal, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(literal)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| parse_date(literal).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// A field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce a filter literal for a field of type `ty`.
    ///
    /// The exact literal `NULL` denotes the null value for every type.
    pub fn from_literal(ty: FieldType, literal: &str) -> Option<Value> {
        if literal == "NULL" {
            return Some(Value::Null);
        }
        ty.coerce(literal)
    }

    /// SQL-style comparison. `None` when either side is null or the types are
    /// not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting: nulls first, then by value.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMATS[0])),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_table() {
        assert_eq!(FieldType::Text.coerce(" a "), Some(Value::Text(" a ".into())));
        assert_eq!(FieldType::Integer.coerce("42"), Some(Value::Integer(42)));
        assert_eq!(FieldType::Integer.coerce("4.2"), None);
        assert_eq!(FieldType::Float.coerce("4.5"), Some(Value::Float(4.5)));
        assert_eq!(FieldType::Float.coerce("NaN"), None);
        assert_eq!(FieldType::Boolean.coerce("TRUE"), Some(Value::Bool(true)));
        assert_eq!(FieldType::Boolean.coerce("0"), Some(Value::Bool(false)));
        assert_eq!(FieldType::Boolean.coerce("yes"), None);
        assert_eq!(
            FieldType::Date.coerce("2024-03-01"),
            Some(Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );
        assert_eq!(FieldType::Date.coerce("01.03.2024"), None);
    }

    #[test]
    fn test_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        for literal in [
            "2024-03-01 10:30:00",
            "2024-03-01T10:30:00",
            "2024-03-01T10:30:00Z",
            "2024-03-01T12:30:00+02:00",
        ] {
            assert_eq!(
                FieldType::DateTime.coerce(literal),
                Some(Value::DateTime(expected)),
                "{}",
                literal
            );
        }
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            FieldType::DateTime.coerce("2024-03-01"),
            Some(Value::DateTime(midnight))
        );
    }

    #[test]
    fn test_null_literal() {
        assert_eq!(Value::from_literal(FieldType::Integer, "NULL"), Some(Value::Null));
        assert_eq!(
            Value::from_literal(FieldType::Text, "null"),
            Some(Value::Text("null".into()))
        );
    }

    #[test]
    fn test_compare_is_sql_like() {
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(Value::Integer(1).compare(&Value::Null), None);
        assert_eq!(
            Value::Integer(2).compare(&Value::Float(1.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Text("a".into()).compare(&Value::Integer(1)), None);
    }

    #[test]
    fn test_sort_puts_nulls_first() {
        let mut values = vec![Value::Integer(3), Value::Null, Value::Integer(1)];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values, vec![Value::Null, Value::Integer(1), Value::Integer(3)]);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(FieldType::Integer.from_json(&json!(7)), Some(Value::Integer(7)));
        assert_eq!(FieldType::Integer.from_json(&json!("7")), Some(Value::Integer(7)));
        assert_eq!(FieldType::Boolean.from_json(&json!(true)), Some(Value::Bool(true)));
        assert_eq!(FieldType::Date.from_json(&json!(null)), Some(Value::Null));
        assert_eq!(FieldType::Integer.from_json(&json!([1])), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(
            Value::DateTime(
                NaiveDate::from_ymd_opt(2024, 1, 2)
                    .unwrap()
                    .and_hms_opt(3, 4, 5)
                    .unwrap()
            )
            .to_string(),
            "2024-01-02 03:04:05"
        );
    }
}
