//! Type converters and the converter registry.
//!
//! A [`TypeConverter`] turns one raw field into a [`Value`]. Converters see
//! the reader they are running under (as a [`FieldSource`]) and the
//! [`PropertyInfo`] of the property being filled, so a converter may consult
//! other fields of the same record.
//!
//! ## Fallback chain
//!
//! Every built-in specific converter first tries its own lenient parse. When
//! that parse does not recognize the input (or there is no input), it hands
//! the value to [`DefaultTypeConverter`], which runs the strict
//! [`change_type`] parse for the property's declared kind and raises
//! [`Error::Conversion`] if that fails too.
//!
//! ```rust
//! use ltsv_helper::convert::{DecimalConverter, DefaultTypeConverter, TypeConverter};
//! use ltsv_helper::{Decimal, PropertyInfo, Record, Value, ValueKind};
//!
//! let record = Record::new();
//! let info = PropertyInfo::new("price", "price", ValueKind::Decimal);
//!
//! let value = DecimalConverter
//!     .convert_from_string(Some(" 1,024.50 "), &record, &info)
//!     .unwrap();
//! assert_eq!(value, Value::Decimal(Decimal::new(102450, 2)));
//!
//! // Unrecognized input ends up at the default converter
//! let specific = DecimalConverter.convert_from_string(Some("abc"), &record, &info);
//! let default = DefaultTypeConverter.convert_from_string(Some("abc"), &record, &info);
//! assert_eq!(specific.unwrap_err().to_string(), default.unwrap_err().to_string());
//! ```
//!
//! ## Registry
//!
//! [`TypeConverterCache`] maps each [`ValueKind`] to a converter and falls
//! back to its default converter for kinds with no entry.

use crate::class_map::PropertyInfo;
use crate::value::{change_type, Value, ValueKind};
use crate::{Decimal, Error, Record, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Read access to the record a converter is working on.
///
/// Implemented by both readers and by [`Record`] itself, which makes
/// converters easy to call outside a reader.
pub trait FieldSource {
    /// Returns the raw value of `label` in the current record.
    ///
    /// # Errors
    ///
    /// Fails when there is no current record or the label is absent.
    fn get_field(&self, label: &str) -> Result<&str>;

    /// The current record, if any.
    fn current_record(&self) -> Option<&Record>;

    /// 1-based line of the current record, `0` when unknown.
    fn line_number(&self) -> usize {
        0
    }
}

impl FieldSource for Record {
    fn get_field(&self, label: &str) -> Result<&str> {
        self.get(label)
            .ok_or_else(|| Error::missing_field(label, self.line_number()))
    }

    fn current_record(&self) -> Option<&Record> {
        Some(self)
    }
}

/// Converts a raw string field into a typed [`Value`].
pub trait TypeConverter: Send + Sync {
    /// Converts `raw` for the property described by `map`.
    ///
    /// `raw` is `None` when there is no text to convert.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] when the value cannot be produced.
    fn convert_from_string(
        &self,
        raw: Option<&str>,
        reader: &dyn FieldSource,
        map: &PropertyInfo,
    ) -> Result<Value>;
}

impl fmt::Debug for dyn TypeConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeConverter")
    }
}

impl<F> TypeConverter for F
where
    F: Fn(Option<&str>, &dyn FieldSource, &PropertyInfo) -> Result<Value> + Send + Sync,
{
    fn convert_from_string(
        &self,
        raw: Option<&str>,
        reader: &dyn FieldSource,
        map: &PropertyInfo,
    ) -> Result<Value> {
        self(raw, reader, map)
    }
}

/// The converter of last resort: a strict parse into the declared kind.
///
/// `None` converts to [`Value::Null`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTypeConverter;

impl TypeConverter for DefaultTypeConverter {
    fn convert_from_string(
        &self,
        raw: Option<&str>,
        _reader: &dyn FieldSource,
        map: &PropertyInfo,
    ) -> Result<Value> {
        match raw {
            None => Ok(Value::Null),
            Some(text) => change_type(text, map.kind())
                .ok_or_else(|| Error::conversion(map.label(), map.kind(), Some(text))),
        }
    }
}

/// Runs `parse` and defers to [`DefaultTypeConverter`] when it gives up.
fn with_fallback(
    raw: Option<&str>,
    reader: &dyn FieldSource,
    map: &PropertyInfo,
    parse: impl FnOnce(&str) -> Option<Value>,
) -> Result<Value> {
    if let Some(text) = raw {
        if let Some(value) = parse(text) {
            return Ok(value);
        }
        trace!(label = map.label(), kind = %map.kind(), "falling back to default converter");
    }
    DefaultTypeConverter.convert_from_string(raw, reader, map)
}

/// Strips surrounding whitespace and `,` group separators from a number.
fn clean_number(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with(',') || trimmed.ends_with(',') {
        return None;
    }
    Some(trimmed.chars().filter(|&c| c != ',').collect())
}

macro_rules! specific_converter {
    ($(#[$meta:meta])* $name:ident, |$text:ident| $parse:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl TypeConverter for $name {
            fn convert_from_string(
                &self,
                raw: Option<&str>,
                reader: &dyn FieldSource,
                map: &PropertyInfo,
            ) -> Result<Value> {
                with_fallback(raw, reader, map, |$text: &str| $parse)
            }
        }
    };
}

macro_rules! integer_converter {
    ($($name:ident => $ty:ty, $variant:ident;)*) => {
        $(
            specific_converter!(
                #[doc = concat!("Converts to `", stringify!($ty), "`, tolerating whitespace and `,` group separators.")]
                $name,
                |text| clean_number(text)?.parse::<$ty>().ok().map(Value::$variant)
            );
        )*
    };
}

integer_converter! {
    Int8Converter => i8, I8;
    Int16Converter => i16, I16;
    Int32Converter => i32, I32;
    Int64Converter => i64, I64;
    UInt8Converter => u8, U8;
    UInt16Converter => u16, U16;
    UInt32Converter => u32, U32;
    UInt64Converter => u64, U64;
}

fn parse_float(text: &str) -> Option<f64> {
    let cleaned = clean_number(text)?;
    match cleaned.to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "infinity" | "+infinity" | "inf" | "+inf" => Some(f64::INFINITY),
        "-infinity" | "-inf" => Some(f64::NEG_INFINITY),
        _ => cleaned.parse().ok(),
    }
}

specific_converter!(
    /// Converts to `f32`; accepts `NaN`, `Infinity` and `,` group separators.
    SingleConverter,
    |text| parse_float(text).map(|f| Value::F32(f as f32))
);

specific_converter!(
    /// Converts to `f64`; accepts `NaN`, `Infinity` and `,` group separators.
    DoubleConverter,
    |text| parse_float(text).map(Value::F64)
);

specific_converter!(
    /// Culture-invariant decimal parse via [`Decimal::parse_invariant`].
    DecimalConverter,
    |text| Decimal::parse_invariant(text).map(Value::Decimal)
);

specific_converter!(
    /// Converts to `bool`; accepts `true/false`, `1/0`, `yes/no`, `y/n`, `on/off`.
    BooleanConverter,
    |text| match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Some(Value::Bool(true)),
        "false" | "0" | "no" | "n" | "off" => Some(Value::Bool(false)),
        _ => None,
    }
);

specific_converter!(
    /// Converts to `char`; surrounding whitespace is ignored around a single character.
    CharConverter,
    |text| {
        let candidate = if text.chars().count() == 1 { text } else { text.trim() };
        let mut chars = candidate.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Value::Char(c)),
            _ => None,
        }
    }
);

specific_converter!(
    /// Passes the raw string through unchanged.
    StringConverter,
    |text| Some(Value::String(text.to_string()))
);

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%d/%b/%Y:%H:%M:%S %z",
];

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%b/%Y:%H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%b/%Y"];

specific_converter!(
    /// Converts to `DateTime<FixedOffset>`: RFC 3339, `%Y-%m-%d %H:%M:%S%z`,
    /// and the access-log form `10/Oct/2000:13:55:36 -0700`.
    DateTimeConverter,
    |text| {
        let text = text.trim();
        DateTime::parse_from_rfc3339(text)
            .ok()
            .or_else(|| {
                DATE_TIME_FORMATS
                    .iter()
                    .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
            })
            .map(Value::DateTime)
    }
);

specific_converter!(
    /// Converts to `NaiveDateTime` using ISO, space-separated and access-log layouts.
    NaiveDateTimeConverter,
    |text| {
        let text = text.trim();
        NAIVE_DATE_TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(Value::NaiveDateTime)
    }
);

specific_converter!(
    /// Converts to `NaiveDate` from `2000-10-10`, `2000/10/10` or `10/Oct/2000`.
    NaiveDateConverter,
    |text| {
        let text = text.trim();
        NAIVE_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .map(Value::NaiveDate)
    }
);

/// Registry of converters keyed by [`ValueKind`].
///
/// # Examples
///
/// ```rust
/// use ltsv_helper::convert::{DefaultTypeConverter, TypeConverterCache};
/// use ltsv_helper::ValueKind;
/// use std::sync::Arc;
///
/// let mut cache = TypeConverterCache::new();
/// assert!(cache.contains(ValueKind::Decimal));
///
/// cache.remove_converter(ValueKind::Decimal);
/// assert!(!cache.contains(ValueKind::Decimal));
///
/// cache.add_converter(ValueKind::Decimal, Arc::new(DefaultTypeConverter));
/// assert!(cache.contains(ValueKind::Decimal));
/// ```
#[derive(Clone)]
pub struct TypeConverterCache {
    converters: HashMap<ValueKind, Arc<dyn TypeConverter>>,
    default: Arc<dyn TypeConverter>,
}

impl TypeConverterCache {
    /// Creates a registry holding the built-in converter for every kind.
    #[must_use]
    pub fn new() -> Self {
        let mut cache = Self::empty();
        for kind in ValueKind::ALL {
            let converter: Arc<dyn TypeConverter> = match kind {
                ValueKind::String => Arc::new(StringConverter),
                ValueKind::Bool => Arc::new(BooleanConverter),
                ValueKind::Char => Arc::new(CharConverter),
                ValueKind::I8 => Arc::new(Int8Converter),
                ValueKind::I16 => Arc::new(Int16Converter),
                ValueKind::I32 => Arc::new(Int32Converter),
                ValueKind::I64 => Arc::new(Int64Converter),
                ValueKind::U8 => Arc::new(UInt8Converter),
                ValueKind::U16 => Arc::new(UInt16Converter),
                ValueKind::U32 => Arc::new(UInt32Converter),
                ValueKind::U64 => Arc::new(UInt64Converter),
                ValueKind::F32 => Arc::new(SingleConverter),
                ValueKind::F64 => Arc::new(DoubleConverter),
                ValueKind::Decimal => Arc::new(DecimalConverter),
                ValueKind::DateTime => Arc::new(DateTimeConverter),
                ValueKind::NaiveDateTime => Arc::new(NaiveDateTimeConverter),
                ValueKind::NaiveDate => Arc::new(NaiveDateConverter),
            };
            cache.converters.insert(kind, converter);
        }
        cache
    }

    /// Creates a registry with no specific converters.
    #[must_use]
    pub fn empty() -> Self {
        TypeConverterCache {
            converters: HashMap::new(),
            default: Arc::new(DefaultTypeConverter),
        }
    }

    /// Returns the converter for `kind`, or the default converter.
    #[must_use]
    pub fn get_converter(&self, kind: ValueKind) -> Arc<dyn TypeConverter> {
        self.converters
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default))
    }

    pub fn add_converter(&mut self, kind: ValueKind, converter: Arc<dyn TypeConverter>) {
        self.converters.insert(kind, converter);
    }

    pub fn remove_converter(&mut self, kind: ValueKind) -> Option<Arc<dyn TypeConverter>> {
        self.converters.remove(&kind)
    }

    pub fn set_default_converter(&mut self, converter: Arc<dyn TypeConverter>) {
        self.default = converter;
    }

    #[must_use]
    pub fn contains(&self, kind: ValueKind) -> bool {
        self.converters.contains_key(&kind)
    }
}

impl Default for TypeConverterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeConverterCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.converters.keys().collect();
        kinds.sort();
        f.debug_struct("TypeConverterCache")
            .field("kinds", &kinds)
            .finish_non_exhaustive()
    }
}
