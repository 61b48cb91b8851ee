//! Blocking record reader.
//!
//! [`LtsvReader`] is a cursor over a [`Parser`]: [`read`](LtsvReader::read)
//! advances to the next record, and the `get_*` methods look at the record
//! the cursor is on. [`records`](LtsvReader::records) wraps the loop in an
//! iterator.
//!
//! ## Examples
//!
//! ```rust
//! use ltsv_helper::LtsvReader;
//!
//! let mut reader = LtsvReader::from_str("host:127.0.0.1\tstatus:200\nhost:::1\tstatus:404\n");
//! let mut statuses = Vec::new();
//! while reader.read().unwrap() {
//!     statuses.push(reader.get_field_as::<u16>("status").unwrap());
//! }
//! assert_eq!(statuses, vec![200, 404]);
//! ```

use crate::class_map::Mappable;
use crate::convert::FieldSource;
use crate::de::from_record;
use crate::value::{change_type, FieldValue};
use crate::{Configuration, Error, LtsvOptions, Parser, Record, Result};
use serde::de::DeserializeOwned;
use std::io::BufRead;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::sync::Arc;

/// The current-record slot shared by the blocking and async readers.
#[derive(Debug)]
pub(crate) struct Cursor {
    config: Arc<Configuration>,
    current: Option<Record>,
    line: usize,
    has_been_read: bool,
}

impl Cursor {
    pub(crate) fn new(config: Arc<Configuration>) -> Self {
        Cursor {
            config,
            current: None,
            line: 0,
            has_been_read: false,
        }
    }

    pub(crate) fn config(&self) -> &Arc<Configuration> {
        &self.config
    }

    pub(crate) fn advance(&mut self, next: Option<Record>, line: usize) -> bool {
        self.has_been_read = true;
        self.line = line;
        self.current = next;
        self.current.is_some()
    }

    pub(crate) fn check_has_been_read(&self) -> Result<()> {
        if self.has_been_read {
            Ok(())
        } else {
            Err(Error::state(
                "you must call read on the reader before accessing its data",
            ))
        }
    }

    pub(crate) fn record(&self) -> Result<&Record> {
        self.check_has_been_read()?;
        self.current
            .as_ref()
            .ok_or_else(|| Error::state("the reader is past the last record"))
    }

    pub(crate) fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn get_field(&self, label: &str) -> Result<&str> {
        if label.is_empty() {
            return Err(Error::invalid_argument("label", "must not be empty"));
        }
        self.record()?
            .get(label)
            .ok_or_else(|| Error::missing_field(label, self.line))
    }

    pub(crate) fn get_field_as<T: FieldValue>(&self, label: &str) -> Result<T> {
        let raw = self.get_field(label)?;
        change_type(raw, T::kind())
            .and_then(T::from_value)
            .ok_or_else(|| Error::conversion(label, T::kind(), Some(raw)))
    }

    pub(crate) fn get_record<T: Mappable>(&self, source: &dyn FieldSource) -> Result<T> {
        self.check_has_been_read()?;
        let class_map = self.config.get_class_map::<T>()?;
        class_map.map_record(source)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        from_record(self.record()?)
    }
}

impl FieldSource for Cursor {
    fn get_field(&self, label: &str) -> Result<&str> {
        Cursor::get_field(self, label)
    }

    fn current_record(&self) -> Option<&Record> {
        self.current.as_ref()
    }

    fn line_number(&self) -> usize {
        self.line
    }
}

/// Reads LTSV records from a blocking stream.
pub struct LtsvReader<R> {
    parser: Parser<R>,
    cursor: Cursor,
}

impl<'a> LtsvReader<&'a [u8]> {
    /// Creates a reader over an in-memory string.
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn from_str(input: &'a str) -> Self {
        LtsvReader::new(input.as_bytes())
    }
}

impl<R: BufRead> LtsvReader<R> {
    /// Creates a reader with the default configuration.
    pub fn new(reader: R) -> Self {
        Self::with_configuration(reader, Arc::new(Configuration::new()))
    }

    /// Creates a reader with a private configuration using `options`.
    pub fn with_options(reader: R, options: LtsvOptions) -> Self {
        Self::with_configuration(reader, Arc::new(Configuration::new().with_options(options)))
    }

    /// Creates a reader sharing `config` with other readers.
    pub fn with_configuration(reader: R, config: Arc<Configuration>) -> Self {
        LtsvReader {
            parser: Parser::with_options(reader, config.options().clone()),
            cursor: Cursor::new(config),
        }
    }

    /// Advances to the next record.
    ///
    /// Returns `false` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for a malformed line and [`Error::Io`] when
    /// the stream fails.
    pub fn read(&mut self) -> Result<bool> {
        let next = self.parser.read()?;
        Ok(self.cursor.advance(next, self.parser.line_number()))
    }

    /// Returns the raw value of `label` in the current record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty label, [`Error::State`]
    /// before the first [`read`](Self::read) or after the last record, and
    /// [`Error::MissingField`] if the label is absent.
    pub fn get_field(&self, label: &str) -> Result<&str> {
        self.cursor.get_field(label)
    }

    /// Returns the value of `label` parsed as `T`.
    ///
    /// This uses the plain parse for `T`'s kind; the converter registry is
    /// not consulted.
    ///
    /// # Errors
    ///
    /// As [`get_field`](Self::get_field), plus [`Error::Conversion`].
    pub fn get_field_as<T: FieldValue>(&self, label: &str) -> Result<T> {
        self.cursor.get_field_as(label)
    }

    /// Maps the current record into a new `T` through its class map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::State`] before the first read, [`Error::Configuration`]
    /// if `T` cannot be mapped, and [`Error::Conversion`] if a present field
    /// cannot be converted.
    pub fn get_record<T: Mappable>(&self) -> Result<T> {
        self.cursor.get_record(self)
    }

    /// Deserializes the current record into `T` with serde.
    ///
    /// # Errors
    ///
    /// Returns [`Error::State`] without a current record and the deserializer's
    /// errors otherwise.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        self.cursor.deserialize()
    }

    /// Iterates over the remaining records, mapped into `T`.
    ///
    /// The iterator is single-pass and stops after the first error.
    pub fn records<T: Mappable>(&mut self) -> Records<'_, R, T> {
        Records {
            reader: self,
            done: false,
            marker: PhantomData,
        }
    }

    /// The current record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::State`] when there is no current record.
    pub fn record(&self) -> Result<&Record> {
        self.cursor.record()
    }

    /// 1-based line of the current record.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.cursor.line()
    }

    #[must_use]
    pub fn configuration(&self) -> &Arc<Configuration> {
        self.cursor.config()
    }

    /// Releases the underlying stream. Further calls do nothing.
    pub fn close(&mut self) {
        self.parser.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.parser.is_closed()
    }
}

impl<R: BufRead> FieldSource for LtsvReader<R> {
    fn get_field(&self, label: &str) -> Result<&str> {
        self.cursor.get_field(label)
    }

    fn current_record(&self) -> Option<&Record> {
        self.cursor.current_record()
    }

    fn line_number(&self) -> usize {
        self.cursor.line()
    }
}

/// Iterator returned by [`LtsvReader::records`].
pub struct Records<'a, R, T> {
    reader: &'a mut LtsvReader<R>,
    done: bool,
    marker: PhantomData<fn() -> T>,
}

impl<R: BufRead, T: Mappable> Iterator for Records<'_, R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.reader.read() {
            Ok(true) => self.reader.get_record::<T>(),
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };
        self.done = item.is_err();
        Some(item)
    }
}

impl<R: BufRead, T: Mappable> FusedIterator for Records<'_, R, T> {}
