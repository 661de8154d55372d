//! Canonical scalar value representation carried by literal expressions.
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

use crate::types::DataType;

/// Typed value tagged with explicit type information so serialized plans
/// remain unambiguous.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    /// Null literal.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Signed 64-bit integer literal.
    Int(i64),
    /// 64-bit floating point literal.
    Float(f64),
    /// UTF-8 string literal.
    String(String),
    /// Arbitrary binary payload represented as bytes.
    Bytes(Vec<u8>),
    /// Calendar date as days since 1970-01-01.
    Date(i32),
}

impl Value {
    /// Type assigned to the literal during analysis. Integers that fit in
    /// 32 bits are `INT`, wider ones `BIGINT`.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Bool(_) => DataType::Boolean,
            Value::Int(v) if i32::try_from(*v).is_ok() => DataType::Int,
            Value::Int(_) => DataType::BigInt,
            Value::Float(_) => DataType::Double,
            Value::String(_) => DataType::Varchar,
            Value::Bytes(_) => DataType::Varbinary,
            Value::Date(_) => DataType::Date,
        }
    }

    /// Renders the literal as SQL text.
    pub fn to_sql(&self) -> String {
        match self {
            Value::Null => "NULL".into(),
            Value::Bool(true) => "TRUE".into(),
            Value::Bool(false) => "FALSE".into(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => format!("{v:?}"),
            Value::String(v) => format!("'{}'", v.replace('\'', "''")),
            Value::Bytes(v) => format!("X'{}'", hex::encode_upper(v)),
            Value::Date(days) => match epoch_date(*days) {
                Some(date) => format!("DATE '{date}'"),
                None => format!("CAST({days} AS DATE)"),
            },
        }
    }
}

// Julian day number of 1970-01-01.
const UNIX_EPOCH_JULIAN_DAY: i32 = 2_440_588;

fn epoch_date(days: i32) -> Option<String> {
    let julian = days.checked_add(UNIX_EPOCH_JULIAN_DAY)?;
    let date = Date::from_julian_day(julian).ok()?;
    date.format(format_description!("[year]-[month]-[day]")).ok()
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}
