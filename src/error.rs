//! Error types for LTSV reading and record mapping.
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error
//! type is the single [`Error`] enum below.
//!
//! ## Error Categories
//!
//! - **State errors**: record data accessed before the reader was advanced
//! - **Parse errors**: a field on a line has no `label:value` separator
//! - **Missing fields**: a label requested directly is absent from the record
//! - **Conversion errors**: no converter could turn a raw value into its target type
//! - **Configuration errors**: a target type cannot be mapped
//! - **I/O errors**: passed through from the underlying stream untouched
//!
//! ## Examples
//!
//! ```rust
//! use ltsv_helper::{Error, LtsvReader};
//!
//! let reader = LtsvReader::from_str("name:Alice\n");
//! let err = reader.get_field("name").unwrap_err();
//! assert!(matches!(err, Error::State(_)));
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

use crate::value::ValueKind;

/// Represents all possible errors raised while reading and mapping LTSV data.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying stream, propagated unchanged
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The reader has no current record to read from
    #[error("Invalid reader state: {0}")]
    State(String),

    /// A line could not be split into fields
    #[error("Parse error at line {line}: {msg}\n{field}")]
    Parse {
        line: usize,
        field: String,
        msg: String,
    },

    /// A label requested through direct field access is absent
    #[error("Field '{label}' not found in record at line {line}")]
    MissingField { label: String, line: usize },

    /// No converter recognized the raw value
    #[error("Cannot convert field '{label}' value {value:?} to {target}")]
    Conversion {
        label: String,
        target: ValueKind,
        value: Option<String>,
    },

    /// A target type cannot be mapped
    #[error("Configuration error for {type_name}: {msg}")]
    Configuration { type_name: String, msg: String },

    /// A record cannot be written without corrupting the line structure
    #[error("Cannot write {what} {text:?}: {msg}")]
    Unrepresentable {
        what: &'static str,
        text: String,
        msg: String,
    },

    /// A caller passed an unusable argument
    #[error("Invalid argument `{name}`: {msg}")]
    InvalidArgument { name: &'static str, msg: String },

    /// Custom error, raised by the serde path
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a state error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ltsv_helper::Error;
    ///
    /// let err = Error::state("no current record");
    /// assert!(err.to_string().contains("no current record"));
    /// ```
    pub fn state(msg: &str) -> Self {
        Error::State(msg.to_string())
    }

    /// Creates a parse error for the given 1-based line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ltsv_helper::Error;
    ///
    /// let err = Error::parse(3, "hostexample", "field has no ':' separator");
    /// assert!(err.to_string().contains("line 3"));
    /// ```
    pub fn parse(line: usize, field: &str, msg: &str) -> Self {
        Error::Parse {
            line,
            field: field.to_string(),
            msg: msg.to_string(),
        }
    }

    pub fn invalid_argument(name: &'static str, msg: &str) -> Self {
        Error::InvalidArgument {
            name,
            msg: msg.to_string(),
        }
    }

    pub fn missing_field(label: &str, line: usize) -> Self {
        Error::MissingField {
            label: label.to_string(),
            line,
        }
    }

    /// Creates a conversion error naming the label, the target kind and the raw value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ltsv_helper::{Error, ValueKind};
    ///
    /// let err = Error::conversion("age", ValueKind::I32, Some("thirty"));
    /// let msg = err.to_string();
    /// assert!(msg.contains("age") && msg.contains("i32") && msg.contains("thirty"));
    /// ```
    pub fn conversion(label: &str, target: ValueKind, value: Option<&str>) -> Self {
        Error::Conversion {
            label: label.to_string(),
            target,
            value: value.map(str::to_string),
        }
    }

    pub fn configuration(type_name: &str, msg: &str) -> Self {
        Error::Configuration {
            type_name: type_name.to_string(),
            msg: msg.to_string(),
        }
    }

    pub fn unrepresentable(what: &'static str, text: &str, msg: &str) -> Self {
        Error::Unrepresentable {
            what,
            text: text.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns `true` if this error came from the underlying stream.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
