#![forbid(unsafe_code)]

//! Identifiers and scalar types shared by the expression and analyzer layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a resolved column slot.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct SlotId(pub u32);

/// Identifier of the tuple (table instance or inline view) owning a slot.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct TupleId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TupleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SlotId {
    fn from(value: u32) -> Self {
        SlotId(value)
    }
}

impl From<SlotId> for u32 {
    fn from(value: SlotId) -> Self {
        value.0
    }
}

impl From<u32> for TupleId {
    fn from(value: u32) -> Self {
        TupleId(value)
    }
}

/// Scalar type attached to analyzed expressions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Type of the untyped `NULL` literal.
    Null,
    /// Boolean.
    Boolean,
    /// Signed 32-bit integer.
    Int,
    /// Signed 64-bit integer.
    BigInt,
    /// 64-bit floating point.
    Double,
    /// Variable-length UTF-8 string.
    Varchar,
    /// Binary payload.
    Varbinary,
    /// Calendar date (days since Unix epoch).
    Date,
}

impl DataType {
    /// Returns true for the integer and floating point types.
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int | DataType::BigInt | DataType::Double)
    }

    fn numeric_rank(self) -> Option<u8> {
        match self {
            DataType::Int => Some(0),
            DataType::BigInt => Some(1),
            DataType::Double => Some(2),
            _ => None,
        }
    }

    /// Whether a value of type `other` can stand where `self` is expected
    /// without an explicit cast.
    pub fn is_assignable_from(self, other: DataType) -> bool {
        if self == other || other == DataType::Null {
            return true;
        }
        match (self.numeric_rank(), other.numeric_rank()) {
            (Some(target), Some(source)) => source <= target,
            _ => false,
        }
    }

    /// Smallest numeric type able to hold both operands.
    pub fn wider(self, other: DataType) -> Option<DataType> {
        if self == DataType::Null {
            return Some(other);
        }
        if other == DataType::Null {
            return Some(self);
        }
        match (self.numeric_rank(), other.numeric_rank()) {
            (Some(a), Some(b)) => Some(if a >= b { self } else { other }),
            _ if self == other => Some(self),
            _ => None,
        }
    }

    /// SQL spelling of the type.
    pub fn sql_name(self) -> &'static str {
        match self {
            DataType::Null => "NULL_TYPE",
            DataType::Boolean => "BOOLEAN",
            DataType::Int => "INT",
            DataType::BigInt => "BIGINT",
            DataType::Double => "DOUBLE",
            DataType::Varchar => "VARCHAR",
            DataType::Varbinary => "VARBINARY",
            DataType::Date => "DATE",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_widening_is_one_way() {
        assert!(DataType::BigInt.is_assignable_from(DataType::Int));
        assert!(DataType::Double.is_assignable_from(DataType::BigInt));
        assert!(!DataType::Int.is_assignable_from(DataType::BigInt));
        assert!(!DataType::Int.is_assignable_from(DataType::Varchar));
        assert!(DataType::Varchar.is_assignable_from(DataType::Null));
    }

    #[test]
    fn wider_picks_the_larger_numeric() {
        assert_eq!(DataType::Int.wider(DataType::Double), Some(DataType::Double));
        assert_eq!(DataType::Null.wider(DataType::Date), Some(DataType::Date));
        assert_eq!(DataType::Varchar.wider(DataType::Int), None);
        assert_eq!(DataType::Date.wider(DataType::Date), Some(DataType::Date));
    }
}
