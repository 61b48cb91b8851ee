//! Async record reader over [`tokio::io::AsyncBufRead`].
//!
//! [`AsyncParser`] and [`AsyncLtsvReader`] mirror [`Parser`](crate::Parser)
//! and [`LtsvReader`](crate::LtsvReader). The only await point is the line
//! read; splitting a line into fields and mapping a record happen
//! synchronously, with the same code the blocking reader uses.
//!
//! ## Examples
//!
//! ```rust
//! use ltsv_helper::AsyncLtsvReader;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut reader = AsyncLtsvReader::new("a:1\nb:2\n".as_bytes());
//! let mut count = 0;
//! while reader.read().await.unwrap() {
//!     count += 1;
//! }
//! assert_eq!(count, 2);
//! # });
//! ```

use crate::class_map::Mappable;
use crate::convert::FieldSource;
use crate::parser::{closed_stream, LineSplitter, Step};
use crate::reader::Cursor;
use crate::value::FieldValue;
use crate::{Configuration, LtsvOptions, Record, Result};
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

/// Async LTSV parser.
pub struct AsyncParser<R> {
    reader: Option<R>,
    buf: String,
    splitter: LineSplitter,
}

impl<R: AsyncBufRead + Unpin> AsyncParser<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, LtsvOptions::default())
    }

    pub fn with_options(reader: R, options: LtsvOptions) -> Self {
        AsyncParser {
            reader: Some(reader),
            buf: String::new(),
            splitter: LineSplitter::new(options),
        }
    }

    /// Reads the next record, or `None` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Same as [`Parser::read`](crate::Parser::read).
    pub async fn read(&mut self) -> Result<Option<Record>> {
        loop {
            if self.splitter.is_finished() {
                return Ok(None);
            }
            let reader = self.reader.as_mut().ok_or_else(closed_stream)?;
            self.buf.clear();
            let n = reader.read_line(&mut self.buf).await?;
            match self.splitter.accept(&self.buf, n)? {
                Step::Record(record) => return Ok(Some(record)),
                Step::Skip => continue,
                Step::End => return Ok(None),
            }
        }
    }

    #[must_use]
    pub fn line_number(&self) -> usize {
        self.splitter.line()
    }

    /// Releases the underlying stream. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!(line = self.splitter.line(), "closed async LTSV stream");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }
}

/// Reads LTSV records from an async stream.
pub struct AsyncLtsvReader<R> {
    parser: AsyncParser<R>,
    cursor: Cursor,
}

impl<R: AsyncBufRead + Unpin> AsyncLtsvReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_configuration(reader, Arc::new(Configuration::new()))
    }

    pub fn with_options(reader: R, options: LtsvOptions) -> Self {
        Self::with_configuration(reader, Arc::new(Configuration::new().with_options(options)))
    }

    pub fn with_configuration(reader: R, config: Arc<Configuration>) -> Self {
        AsyncLtsvReader {
            parser: AsyncParser::with_options(reader, config.options().clone()),
            cursor: Cursor::new(config),
        }
    }

    /// Advances to the next record; `false` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Same as [`LtsvReader::read`](crate::LtsvReader::read).
    pub async fn read(&mut self) -> Result<bool> {
        let next = self.parser.read().await?;
        Ok(self.cursor.advance(next, self.parser.line_number()))
    }

    /// See [`LtsvReader::get_field`](crate::LtsvReader::get_field).
    pub fn get_field(&self, label: &str) -> Result<&str> {
        self.cursor.get_field(label)
    }

    /// See [`LtsvReader::get_field_as`](crate::LtsvReader::get_field_as).
    pub fn get_field_as<T: FieldValue>(&self, label: &str) -> Result<T> {
        self.cursor.get_field_as(label)
    }

    /// See [`LtsvReader::get_record`](crate::LtsvReader::get_record).
    pub fn get_record<T: Mappable>(&self) -> Result<T> {
        self.cursor.get_record(self)
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        self.cursor.deserialize()
    }

    /// Advances and maps the next record, or `None` at the end of the stream.
    ///
    /// # Errors
    ///
    /// Any error of [`read`](Self::read) or [`get_record`](Self::get_record).
    pub async fn next_record<T: Mappable>(&mut self) -> Result<Option<T>> {
        if self.read().await? {
            self.get_record().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Streams the remaining records, mapped into `T`.
    ///
    /// Single-pass; the stream ends after the first error.
    pub fn records<T: Mappable>(&mut self) -> impl Stream<Item = Result<T>> + '_ {
        stream::unfold(Some(self), |state| async move {
            let reader = state?;
            match reader.next_record::<T>().await {
                Ok(Some(record)) => Some((Ok(record), Some(reader))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    pub fn record(&self) -> Result<&Record> {
        self.cursor.record()
    }

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

impl<R: AsyncBufRead + Unpin> FieldSource for AsyncLtsvReader<R> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassMapBuilder, Error};
    use futures::TryStreamExt;

    #[derive(Default, Debug, PartialEq)]
    struct Entry {
        level: String,
        code: u32,
    }

    impl Mappable for Entry {
        fn configure(map: &mut ClassMapBuilder<Self>) {
            map.default_constructor();
            map.property("level", |e: &mut Entry, v: String| e.level = v);
            map.property("code", |e: &mut Entry, v: u32| e.code = v);
        }
    }

    #[tokio::test]
    async fn test_state_error_before_read() {
        let reader = AsyncLtsvReader::new("level:info\n".as_bytes());
        assert!(matches!(reader.get_field("level"), Err(Error::State(_))));
    }

    #[tokio::test]
    async fn test_records_stream() {
        let mut reader = AsyncLtsvReader::new("level:info\tcode:1\nlevel:warn\tcode:2\n".as_bytes());
        let entries: Vec<Entry> = reader.records::<Entry>().try_collect().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].level, "warn");
        assert!(!reader.read().await.unwrap());
    }

    #[tokio::test]
    async fn test_next_record_propagates_parse_error() {
        let mut reader = AsyncLtsvReader::new("level:info\nbroken\n".as_bytes());
        assert!(reader.next_record::<Entry>().await.unwrap().is_some());
        assert!(matches!(
            reader.next_record::<Entry>().await,
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut parser = AsyncParser::new("a:1\n".as_bytes());
        parser.close();
        parser.close();
        assert!(parser.read().await.unwrap_err().is_io());
    }
}
