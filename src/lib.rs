//! # ltsv_helper
//!
//! A reader for LTSV (Labeled Tab-Separated Values) with configurable
//! mapping of records into Rust types.
//!
//! ## What is LTSV?
//!
//! LTSV is a line-oriented text format: every line is a record, and every
//! record is a tab-separated list of `label:value` fields.
//!
//! ```text
//! host:127.0.0.1	ident:-	status:200	size:5316	ua:Mozilla/5.0
//! ```
//!
//! See the [`format`] module for the exact rules this crate applies.
//!
//! ## Key Features
//!
//! - **Cursor API**: [`LtsvReader::read`] advances, `get_*` methods read the current record
//! - **Typed mapping**: [`Mappable`] types declare a class map of labels, setters and converters
//! - **Pluggable converters**: a [`TypeConverterCache`] per [`Configuration`], with fallback chains
//! - **Serde support**: any `Deserialize` type can be read with [`LtsvReader::deserialize`]
//! - **Async**: [`AsyncLtsvReader`] over `tokio::io::AsyncBufRead`, same semantics
//!
//! ## Quick Start
//!
//! ```rust
//! use ltsv_helper::{ClassMapBuilder, LtsvReader, Mappable};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Mappable for Person {
//!     fn configure(map: &mut ClassMapBuilder<Self>) {
//!         map.default_constructor();
//!         map.property("Name", |p: &mut Person, v: String| p.name = v).label("name");
//!         map.property("Age", |p: &mut Person, v: i32| p.age = v).label("age");
//!     }
//! }
//!
//! let mut reader = LtsvReader::from_str("name:Alice\tage:30\nname:Bob\tage:25\n");
//! let people: Vec<Person> = reader.records::<Person>().collect::<Result<_, _>>().unwrap();
//! assert_eq!(people[0], Person { name: "Alice".to_string(), age: 30 });
//! assert_eq!(people.len(), 2);
//! ```
//!
//! ### Direct field access
//!
//! ```rust
//! use ltsv_helper::LtsvReader;
//!
//! let mut reader = LtsvReader::from_str("status:200\tsize:5316\n");
//! assert!(reader.read().unwrap());
//! assert_eq!(reader.get_field("status").unwrap(), "200");
//! assert_eq!(reader.get_field_as::<u64>("size").unwrap(), 5316);
//! ```
//!
//! ### Serde
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Hit {
//!     status: u16,
//! }
//!
//! let hits: Vec<Hit> = ltsv_helper::from_str("status:200\nstatus:404\n").unwrap();
//! assert_eq!(hits[1].status, 404);
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (`trace` per parsed record and converter
//! fallback, `debug` for class map builds, duplicate labels and stream
//! closing). Install any subscriber to see them.

pub mod async_reader;
pub mod class_map;
pub mod config;
pub mod convert;
pub mod de;
pub mod decimal;
pub mod error;
pub mod format;
pub mod macros;
pub mod options;
pub mod parser;
pub mod reader;
pub mod record;
pub mod ser;
pub mod value;

pub use async_reader::{AsyncLtsvReader, AsyncParser};
pub use class_map::{
    ClassMap, ClassMapBuilder, LabelConvention, Mappable, PropertyBuilder, PropertyInfo,
    PropertyMap,
};
pub use config::Configuration;
pub use convert::{FieldSource, TypeConverter, TypeConverterCache};
pub use decimal::Decimal;
pub use error::{Error, Result};
pub use options::{DuplicateLabelPolicy, EmptyLinePolicy, LtsvOptions};
pub use parser::Parser;
pub use reader::{LtsvReader, Records};
pub use record::Record;
pub use ser::LtsvWriter;
pub use value::{FieldValue, Value, ValueKind};

use serde::de::DeserializeOwned;
use std::io;

/// Deserializes every record of an LTSV string into `T` with serde.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
///
/// let rows: Vec<HashMap<String, String>> = ltsv_helper::from_str("a:1\n\nb:2").unwrap();
/// assert_eq!(rows.len(), 2);
/// ```
///
/// # Errors
///
/// Returns the first parse or deserialization error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    from_reader(s.as_bytes())
}

/// Deserializes every record read from a buffered stream into `T` with serde.
///
/// # Errors
///
/// Returns the first I/O, parse or deserialization error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(reader: R) -> Result<Vec<T>>
where
    R: io::BufRead,
    T: DeserializeOwned,
{
    let mut reader = LtsvReader::new(reader);
    let mut out = Vec::new();
    while reader.read()? {
        out.push(reader.deserialize()?);
    }
    Ok(out)
}

/// Parses every line of an LTSV string into raw records.
///
/// # Examples
///
/// ```rust
/// let records = ltsv_helper::parse_records("a:1\tb:2\nc:3\n").unwrap();
/// assert_eq!(records[0].get("b"), Some("2"));
/// ```
///
/// # Errors
///
/// Returns the first parse error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_records(s: &str) -> Result<Vec<Record>> {
    Parser::new(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_from_str() {
        let points: Vec<Point> = from_str("x:1\ty:2\nx:-3\ty:4\n").unwrap();
        assert_eq!(points, vec![Point { x: 1, y: 2 }, Point { x: -3, y: 4 }]);
    }

    #[test]
    fn test_from_str_reports_line() {
        let err = from_str::<Point>("x:1\ty:2\nx\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_parse_records_empty_input() {
        assert!(parse_records("").unwrap().is_empty());
    }
}
