//! Conversions between field values and SQLite values
//!
//! Booleans are stored as 0/1 integers. Dates and datetimes are stored as
//! ISO-8601 text, which sorts and compares in chronological order.

use lectarium_core::value::{FieldType, Value};
use rusqlite::types::Value as SqlValue;

/// Column affinity for a declared field type
pub fn column_type(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Integer | FieldType::Boolean => "INTEGER",
        FieldType::Float => "REAL",
        FieldType::Text | FieldType::Date | FieldType::DateTime => "TEXT",
    }
}

/// Bind parameter for a field value
pub fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Date(_) | Value::DateTime(_) => SqlValue::Text(value.to_string()),
    }
}

/// Read a stored column back as a typed value. `None` on a type mismatch.
pub fn from_sql(ty: FieldType, value: SqlValue) -> Option<Value> {
    match (ty, value) {
        (_, SqlValue::Null) => Some(Value::Null),
        (FieldType::Integer, SqlValue::Integer(i)) => Some(Value::Integer(i)),
        (FieldType::Float, SqlValue::Real(f)) => Some(Value::Float(f)),
        (FieldType::Float, SqlValue::Integer(i)) => Some(Value::Float(i as f64)),
        (FieldType::Boolean, SqlValue::Integer(i)) => Some(Value::Bool(i != 0)),
        (FieldType::Text, SqlValue::Text(s)) => Some(Value::Text(s)),
        (FieldType::Date | FieldType::DateTime, SqlValue::Text(s)) => ty.coerce(&s),
        _ => None,
    }
}

/// Quote an identifier for use in SQL text.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
