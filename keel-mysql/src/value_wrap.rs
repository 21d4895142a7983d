use keel_core::Value;
use mysql_async::{FromValueError, Value as MySQLValue, prelude::FromValue};

pub(crate) struct ValueWrap(pub(crate) Value);

impl FromValue for ValueWrap {
    type Intermediate = ValueWrap;
}

impl TryFrom<MySQLValue> for ValueWrap {
    type Error = FromValueError;
    fn try_from(value: MySQLValue) -> Result<Self, Self::Error> {
        Ok(ValueWrap(match value {
            MySQLValue::NULL => Value::Null,
            MySQLValue::Bytes(v) => match String::from_utf8(v) {
                Ok(v) => Value::Varchar(Some(v)),
                Err(e) => Value::Blob(Some(e.into_bytes().into())),
            },
            MySQLValue::Int(v) => Value::Int64(Some(v)),
            MySQLValue::UInt(v) => match i64::try_from(v) {
                Ok(v) => Value::Int64(Some(v)),
                Err(..) => Value::Float64(Some(v as f64)),
            },
            MySQLValue::Float(v) => Value::Float64(Some(v.into())),
            MySQLValue::Double(v) => Value::Float64(Some(v)),
            MySQLValue::Date(year, month, day, hour, minute, second, micro) => {
                Value::Varchar(Some(if micro > 0 {
                    format!(
                        "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micro:06}"
                    )
                } else {
                    format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
                }))
            }
            MySQLValue::Time(negative, days, hours, minutes, seconds, micro) => {
                let hours = days * 24 + hours as u32;
                let sign = if negative { "-" } else { "" };
                Value::Varchar(Some(if micro > 0 {
                    format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{micro:06}")
                } else {
                    format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
                }))
            }
        }))
    }
}

impl From<ValueWrap> for MySQLValue {
    fn from(value: ValueWrap) -> Self {
        match value.0 {
            Value::Boolean(Some(v)) => MySQLValue::from(v),
            Value::Int64(Some(v)) => MySQLValue::from(v),
            Value::Float64(Some(v)) => MySQLValue::from(v),
            Value::Varchar(Some(v)) => MySQLValue::from(v),
            Value::Blob(Some(v)) => MySQLValue::Bytes(v.into()),
            _ => MySQLValue::NULL,
        }
    }
}
