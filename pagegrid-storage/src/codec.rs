//! Conversion between JSON field values and SQLite column values.

use pagegrid_model::ColumnKind;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::{Number, Value};

/// Encodes a field value for a column of the given kind.
///
/// Values that do not fit a scalar column (arrays, objects) are stored as
/// their JSON text rather than rejected.
pub(crate) fn to_sql(value: &Value, kind: ColumnKind) -> SqlValue {
    match (kind, value) {
        (_, Value::Null) => SqlValue::Null,
        (ColumnKind::Json, v) => SqlValue::Text(v.to_string()),
        (ColumnKind::Text, Value::String(s)) => SqlValue::Text(s.clone()),
        (ColumnKind::Integer | ColumnKind::Boolean, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        (ColumnKind::Integer | ColumnKind::Boolean, Value::Number(n)) if n.is_i64() => {
            SqlValue::Integer(n.as_i64().unwrap_or_default())
        }
        (ColumnKind::Integer | ColumnKind::Real, Value::Number(n)) => {
            SqlValue::Real(n.as_f64().unwrap_or_default())
        }
        (_, Value::String(s)) => SqlValue::Text(s.clone()),
        (_, other) => SqlValue::Text(other.to_string()),
    }
}

/// Decodes a stored column value.
pub(crate) fn from_sql(value: ValueRef<'_>, kind: ColumnKind) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) if kind == ColumnKind::Boolean => Value::Bool(i != 0),
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            if kind == ColumnKind::Json {
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            } else {
                Value::String(text)
            }
        }
        ValueRef::Blob(_) => Value::Null,
    }
}

/// Renders a constant column default for DDL.
pub(crate) fn sql_literal(value: &Value, kind: ColumnKind) -> String {
    match to_sql(value, kind) {
        SqlValue::Null => "NULL".into(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        SqlValue::Blob(_) => "NULL".into(),
    }
}
