use keel_core::Value;
use rusqlite::{
    ToSql,
    types::{ToSqlOutput, Value as SqliteValue, ValueRef},
};

/// Binds a [`Value`] as a statement parameter.
pub(crate) struct ValueWrap<'a>(pub(crate) &'a Value);

impl ToSql for ValueWrap<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Boolean(Some(v)) => ToSqlOutput::Owned(SqliteValue::Integer(*v as i64)),
            Value::Int64(Some(v)) => ToSqlOutput::Owned(SqliteValue::Integer(*v)),
            Value::Float64(Some(v)) => ToSqlOutput::Owned(SqliteValue::Real(*v)),
            Value::Varchar(Some(v)) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Blob(Some(v)) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            _ => ToSqlOutput::Owned(SqliteValue::Null),
        })
    }
}

pub(crate) fn extract_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(Some(v)),
        ValueRef::Real(v) => Value::Float64(Some(v)),
        ValueRef::Text(v) => Value::Varchar(Some(String::from_utf8_lossy(v).into_owned())),
        ValueRef::Blob(v) => Value::Blob(Some(v.into())),
    }
}
