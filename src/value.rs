//! Dynamic scalar values and their runtime type tags.
//!
//! LTSV values are strings on the wire. Converting them into typed data goes
//! through two types defined here:
//!
//! - [`ValueKind`]: a runtime tag naming a scalar target type
//! - [`Value`]: the converted value itself, tagged by variant
//!
//! [`FieldValue`] ties a Rust type to its [`ValueKind`] and extracts it back
//! out of a [`Value`]. [`change_type`] is the ad-hoc conversion used by
//! [`LtsvReader::get_field_as`](crate::LtsvReader::get_field_as); it is a
//! closed set of plain parse functions, one per kind, and does not consult the
//! converter registry.
//!
//! ## Examples
//!
//! ```rust
//! use ltsv_helper::value::{change_type, FieldValue, Value, ValueKind};
//!
//! let value = change_type("30", ValueKind::I32).unwrap();
//! assert_eq!(value, Value::I32(30));
//! assert_eq!(i32::from_value(value), Some(30));
//! assert_eq!(<Option<i32>>::kind(), ValueKind::I32);
//! ```

use crate::Decimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Runtime tag for a scalar target type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    String,
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    DateTime,
    NaiveDateTime,
    NaiveDate,
}

impl ValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [ValueKind; 17] = [
        ValueKind::String,
        ValueKind::Bool,
        ValueKind::Char,
        ValueKind::I8,
        ValueKind::I16,
        ValueKind::I32,
        ValueKind::I64,
        ValueKind::U8,
        ValueKind::U16,
        ValueKind::U32,
        ValueKind::U64,
        ValueKind::F32,
        ValueKind::F64,
        ValueKind::Decimal,
        ValueKind::DateTime,
        ValueKind::NaiveDateTime,
        ValueKind::NaiveDate,
    ];

    /// Returns the Rust-facing name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "String",
            ValueKind::Bool => "bool",
            ValueKind::Char => "char",
            ValueKind::I8 => "i8",
            ValueKind::I16 => "i16",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::U8 => "u8",
            ValueKind::U16 => "u16",
            ValueKind::U32 => "u32",
            ValueKind::U64 => "u64",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::Decimal => "Decimal",
            ValueKind::DateTime => "DateTime<FixedOffset>",
            ValueKind::NaiveDateTime => "NaiveDateTime",
            ValueKind::NaiveDate => "NaiveDate",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A converted field value.
///
/// `Null` stands for "no value" and is what converters produce for an absent
/// raw string. Only `Option<T>` targets accept it.
#[derive(Clone, Debug, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    DateTime(DateTime<FixedOffset>),
    NaiveDateTime(NaiveDateTime),
    NaiveDate(NaiveDate),
}

impl Value {
    /// Returns the kind of this value, or `None` for `Null`.
    #[must_use]
    pub fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Value::Null => return None,
            Value::String(_) => ValueKind::String,
            Value::Bool(_) => ValueKind::Bool,
            Value::Char(_) => ValueKind::Char,
            Value::I8(_) => ValueKind::I8,
            Value::I16(_) => ValueKind::I16,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::U8(_) => ValueKind::U8,
            Value::U16(_) => ValueKind::U16,
            Value::U32(_) => ValueKind::U32,
            Value::U64(_) => ValueKind::U64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::NaiveDateTime(_) => ValueKind::NaiveDateTime,
            Value::NaiveDate(_) => ValueKind::NaiveDate,
        })
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A Rust type that a field can be converted into.
///
/// Implemented for every scalar named by [`ValueKind`] and for `Option<T>` of
/// those, which maps [`Value::Null`] to `None`.
pub trait FieldValue: Sized {
    /// The runtime tag used to pick a converter.
    fn kind() -> ValueKind;

    /// Extracts `Self` from a converted value of the matching variant.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_field_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn kind() -> ValueKind {
                    ValueKind::$variant
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_field_value! {
    String => String,
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    DateTime<FixedOffset> => DateTime,
    NaiveDateTime => NaiveDateTime,
    NaiveDate => NaiveDate,
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn kind() -> ValueKind {
        T::kind()
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// Converts a raw string into a value of the requested kind.
///
/// Each kind uses the standard `FromStr` parse of its target type, with two
/// exceptions: booleans compare case-insensitively against `true`/`false`,
/// and `char` requires exactly one character. Returns `None` when the text is
/// not a valid literal of that kind.
///
/// # Examples
///
/// ```rust
/// use ltsv_helper::value::{change_type, Value, ValueKind};
///
/// assert_eq!(change_type("TRUE", ValueKind::Bool), Some(Value::Bool(true)));
/// assert_eq!(change_type("x", ValueKind::Char), Some(Value::Char('x')));
/// assert_eq!(change_type("300", ValueKind::U8), None);
/// ```
#[must_use]
pub fn change_type(raw: &str, kind: ValueKind) -> Option<Value> {
    Some(match kind {
        ValueKind::String => Value::String(raw.to_string()),
        ValueKind::Bool => {
            if raw.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if raw.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                return None;
            }
        }
        ValueKind::Char => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => return None,
            }
        }
        ValueKind::I8 => Value::I8(raw.parse().ok()?),
        ValueKind::I16 => Value::I16(raw.parse().ok()?),
        ValueKind::I32 => Value::I32(raw.parse().ok()?),
        ValueKind::I64 => Value::I64(raw.parse().ok()?),
        ValueKind::U8 => Value::U8(raw.parse().ok()?),
        ValueKind::U16 => Value::U16(raw.parse().ok()?),
        ValueKind::U32 => Value::U32(raw.parse().ok()?),
        ValueKind::U64 => Value::U64(raw.parse().ok()?),
        ValueKind::F32 => Value::F32(raw.parse().ok()?),
        ValueKind::F64 => Value::F64(raw.parse().ok()?),
        ValueKind::Decimal => Value::Decimal(raw.parse().ok()?),
        ValueKind::DateTime => Value::DateTime(DateTime::parse_from_rfc3339(raw).ok()?),
        ValueKind::NaiveDateTime => Value::NaiveDateTime(raw.parse().ok()?),
        ValueKind::NaiveDate => Value::NaiveDate(raw.parse().ok()?),
    })
}
