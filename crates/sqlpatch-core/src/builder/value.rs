//! SQL values and parameter handling.
//!
//! Every value that reaches a statement is bound as a parameter; the
//! compiler never inlines values into SQL text.

use std::fmt::Write;
use std::num::FpCategory;

/// A SQL value that can be bound as a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns true if this is the zero value of its type.
    ///
    /// Columns flagged `omit_empty` are left out of INSERT and UPDATE
    /// payloads while they hold a zero value.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(n) => *n == 0,
            Self::Float(f) => f.classify() == FpCategory::Zero,
            Self::Text(s) => s.is_empty(),
            Self::Blob(b) => b.is_empty(),
        }
    }

    /// Returns true for `SqlValue::Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Renders the value as a fragment of a canonical key string.
    ///
    /// Fragments read as SQL literals: text is single quoted, blobs are hex
    /// encoded as `x'..'` and floats always carry a fraction, so values of
    /// different kinds never render alike.
    #[must_use]
    pub fn key_fragment(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Blob(b) => {
                let mut hex = String::with_capacity(b.len() * 2 + 3);
                hex.push_str("x'");
                for byte in b {
                    let _ = write!(hex, "{byte:02x}");
                }
                hex.push('\'');
                hex
            }
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i8 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u8 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

#[cfg(feature = "chrono")]
mod temporal {
    use super::{SqlValue, ToSqlValue};

    impl ToSqlValue for chrono::NaiveDate {
        fn to_sql_value(self) -> SqlValue {
            SqlValue::Text(self.format("%Y-%m-%d").to_string())
        }
    }

    impl ToSqlValue for chrono::NaiveDateTime {
        fn to_sql_value(self) -> SqlValue {
            SqlValue::Text(self.format("%Y-%m-%d %H:%M:%S%.f").to_string())
        }
    }

    impl ToSqlValue for chrono::DateTime<chrono::Utc> {
        fn to_sql_value(self) -> SqlValue {
            SqlValue::Text(self.to_rfc3339())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert!(SqlValue::Null.is_zero());
        assert!(SqlValue::Bool(false).is_zero());
        assert!(SqlValue::Int(0).is_zero());
        assert!(SqlValue::Float(0.0).is_zero());
        assert!(SqlValue::Float(-0.0).is_zero());
        assert!(!SqlValue::Float(f64::MIN_POSITIVE).is_zero());
        assert!(SqlValue::Text(String::new()).is_zero());
        assert!(SqlValue::Blob(vec![]).is_zero());

        assert!(!SqlValue::Bool(true).is_zero());
        assert!(!SqlValue::Int(-1).is_zero());
        assert!(!SqlValue::Text(String::from("x")).is_zero());
    }

    #[test]
    fn test_key_fragment() {
        assert_eq!(SqlValue::Int(42).key_fragment(), "42");
        assert_eq!(SqlValue::Text(String::from("str")).key_fragment(), "'str'");
        assert_eq!(SqlValue::Text(String::from("it's")).key_fragment(), "'it''s'");
        assert_eq!(SqlValue::Float(1.0).key_fragment(), "1.0");
        assert_eq!(SqlValue::Null.key_fragment(), "NULL");
        assert_eq!(SqlValue::Bool(true).key_fragment(), "true");
        assert_eq!(SqlValue::Blob(vec![0xde, 0xad, 0x01]).key_fragment(), "x'dead01'");
    }

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(2.5_f64.to_sql_value(), SqlValue::Float(2.5));
        assert_eq!(
            "hello".to_sql_value(),
            SqlValue::Text(String::from("hello"))
        );
        assert_eq!(None::<i32>.to_sql_value(), SqlValue::Null);
        assert_eq!(Some(42_i32).to_sql_value(), SqlValue::Int(42));
    }
}
