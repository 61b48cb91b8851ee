//! Serde deserialization of records.
//!
//! This module lets any `#[derive(Deserialize)]` type be filled from a
//! [`Record`] without a class map. The record is presented to serde as a map
//! of labels to strings, and each value is parsed on demand into whatever
//! primitive the visitor asks for.
//!
//! ## Usage
//!
//! ```rust
//! use ltsv_helper::{de::from_record, Record};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Hit {
//!     host: String,
//!     status: u16,
//!     #[serde(default)]
//!     referer: Option<String>,
//! }
//!
//! let record: Record = [("host", "example.com"), ("status", "200")].into_iter().collect();
//! let hit: Hit = from_record(&record).unwrap();
//! assert_eq!(hit, Hit { host: "example.com".to_string(), status: 200, referer: None });
//! ```
//!
//! ## Field rules
//!
//! - Missing fields follow serde's rules (`#[serde(default)]` or `Option`)
//! - An empty value deserializes as `None` for `Option` fields
//! - Unit enum variants are matched by name
//! - Sequences and nested maps are not representable in a field

use crate::value::ValueKind;
use crate::{Error, Record, Result};
use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, IntoDeserializer};
use serde::{forward_to_deserialize_any, Deserialize};

/// Deserializes an instance of `T` from a record.
///
/// # Errors
///
/// Returns [`Error::Conversion`] when a field cannot be parsed into the
/// requested type and [`Error::Custom`] for serde-level failures such as a
/// missing required field.
pub fn from_record<'de, T>(record: &'de Record) -> Result<T>
where
    T: Deserialize<'de>,
{
    T::deserialize(RecordDeserializer::new(record))
}

/// Presents a whole record as a serde map.
pub struct RecordDeserializer<'de> {
    record: &'de Record,
}

impl<'de> RecordDeserializer<'de> {
    #[must_use]
    pub fn new(record: &'de Record) -> Self {
        RecordDeserializer { record }
    }
}

impl<'de> de::Deserializer<'de> for RecordDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_map(RecordAccess {
            fields: self.record.iter(),
            value: None,
        })
    }

    fn deserialize_option<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

struct RecordAccess<'de, I> {
    fields: I,
    value: Option<(&'de str, &'de str)>,
}

impl<'de, I> de::MapAccess<'de> for RecordAccess<'de, I>
where
    I: Iterator<Item = (&'de str, &'de str)>,
{
    type Error = Error;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.fields.next() {
            Some((label, raw)) => {
                self.value = Some((label, raw));
                seed.deserialize(BorrowedStrDeserializer::new(label))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: de::DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (label, raw) = self
            .value
            .take()
            .ok_or_else(|| Error::custom("value requested before key"))?;
        seed.deserialize(FieldDeserializer { label, raw })
    }

    fn size_hint(&self) -> Option<usize> {
        self.fields.size_hint().1
    }
}

/// Presents one raw field value to serde.
struct FieldDeserializer<'de> {
    label: &'de str,
    raw: &'de str,
}

impl<'de> FieldDeserializer<'de> {
    fn parse<T: std::str::FromStr>(&self, kind: ValueKind) -> Result<T> {
        self.raw
            .parse()
            .map_err(|_| Error::conversion(self.label, kind, Some(self.raw)))
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident, $ty:ty, $kind:ident;)*) => {
        $(
            fn $method<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                visitor.$visit(self.parse::<$ty>(ValueKind::$kind)?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for FieldDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_str(self.raw)
    }

    fn deserialize_bool<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.raw.eq_ignore_ascii_case("true") {
            visitor.visit_bool(true)
        } else if self.raw.eq_ignore_ascii_case("false") {
            visitor.visit_bool(false)
        } else {
            Err(Error::conversion(self.label, ValueKind::Bool, Some(self.raw)))
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8, i8, I8;
        deserialize_i16 => visit_i16, i16, I16;
        deserialize_i32 => visit_i32, i32, I32;
        deserialize_i64 => visit_i64, i64, I64;
        deserialize_u8 => visit_u8, u8, U8;
        deserialize_u16 => visit_u16, u16, U16;
        deserialize_u32 => visit_u32, u32, U32;
        deserialize_u64 => visit_u64, u64, U64;
        deserialize_f32 => visit_f32, f32, F32;
        deserialize_f64 => visit_f64, f64, F64;
        deserialize_char => visit_char, char, Char;
    }

    fn deserialize_option<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.raw.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(self.raw.into_deserializer())
    }

    fn deserialize_bytes<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_bytes(self.raw.as_bytes())
    }

    fn deserialize_byte_buf<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    forward_to_deserialize_any! {
        i128 u128 str string unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Method {
        Get,
        Post,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Request {
        method: Method,
        path: String,
        size: u64,
        ratio: f64,
        cached: bool,
        #[serde(default)]
        user: Option<String>,
    }

    fn record(fields: &[(&str, &str)]) -> Record {
        fields.iter().copied().collect()
    }

    #[test]
    fn test_struct_from_record() {
        let r = record(&[
            ("method", "post"),
            ("path", "/a:b"),
            ("size", "512"),
            ("ratio", "0.25"),
            ("cached", "False"),
            ("ignored", "x"),
        ]);
        let req: Request = from_record(&r).unwrap();
        assert_eq!(
            req,
            Request {
                method: Method::Post,
                path: "/a:b".to_string(),
                size: 512,
                ratio: 0.25,
                cached: false,
                user: None,
            }
        );
    }

    #[test]
    fn test_empty_value_is_none() {
        #[derive(Deserialize)]
        struct Opt {
            user: Option<String>,
        }
        let parsed: Opt = from_record(&record(&[("user", "")])).unwrap();
        assert!(parsed.user.is_none());
        let parsed: Opt = from_record(&record(&[("user", "bob")])).unwrap();
        assert_eq!(parsed.user.as_deref(), Some("bob"));
    }

    #[test]
    fn test_bad_number_is_conversion_error() {
        #[derive(Deserialize, Debug)]
        #[allow(dead_code)]
        struct Size {
            size: u32,
        }
        match from_record::<Size>(&record(&[("size", "-1")])) {
            Err(Error::Conversion { label, target, .. }) => {
                assert_eq!(label, "size");
                assert_eq!(target, ValueKind::U32);
            }
            other => panic!("Expected conversion error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_field() {
        let err = from_record::<Request>(&record(&[("method", "get")])).unwrap_err();
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_into_string_map() {
        let r = record(&[("a", "1"), ("b", "2")]);
        let map: HashMap<String, String> = from_record(&r).unwrap();
        assert_eq!(map.get("b").map(String::as_str), Some("2"));
    }
}
