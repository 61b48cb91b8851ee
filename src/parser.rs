//! LTSV tokenizer and line parser.
//!
//! This module turns a stream of text into [`Record`]s, one per line.
//!
//! ## Overview
//!
//! - **Line-oriented**: a record ends at `\n`, `\r\n`, or the end of the stream
//! - **Tab-separated fields**: each field is split on its *first* colon, so
//!   values may contain colons (`time:10:30:00`)
//! - **Single pass**: a field is committed to the record as soon as it is split
//! - **Shared splitting**: the blocking [`Parser`] and the async
//!   [`AsyncParser`](crate::async_reader::AsyncParser) feed raw lines through
//!   the same [`LineSplitter`], so both modes produce identical records
//!
//! ## Usage
//!
//! Most users should go through [`LtsvReader`](crate::LtsvReader). The parser
//! is public for callers that only want raw records:
//!
//! ```rust
//! use ltsv_helper::Parser;
//!
//! let mut parser = Parser::new("host:127.0.0.1\treq:GET / HTTP/1.1\n".as_bytes());
//! let record = parser.read().unwrap().unwrap();
//! assert_eq!(record.get("req"), Some("GET / HTTP/1.1"));
//! assert!(parser.read().unwrap().is_none());
//! ```

use crate::options::{DuplicateLabelPolicy, EmptyLinePolicy, LtsvOptions};
use crate::{Error, Record, Result};
use std::borrow::Cow;
use std::io::{self, BufRead};
use tracing::{debug, trace};

const BOM: char = '\u{feff}';

/// Splits one line into a record.
///
/// Empty fields (from doubled or trailing tabs) are skipped, so the returned
/// record may be empty even for a non-empty line.
///
/// # Errors
///
/// Returns [`Error::Parse`] when a field has no colon, has an empty label, or
/// repeats a label under [`DuplicateLabelPolicy::Error`].
///
/// # Examples
///
/// ```rust
/// use ltsv_helper::{parser::parse_line, LtsvOptions};
///
/// let record = parse_line("a:1\tb:x:y", 1, &LtsvOptions::default()).unwrap();
/// assert_eq!(record.get("b"), Some("x:y"));
///
/// assert!(parse_line("a:1\tbroken", 7, &LtsvOptions::default()).is_err());
/// ```
pub fn parse_line(line: &str, line_no: usize, options: &LtsvOptions) -> Result<Record> {
    let mut record = Record::with_capacity(line.matches('\t').count() + 1);

    for field in line.split('\t') {
        if field.is_empty() {
            continue;
        }
        let (label, value) = field
            .split_once(':')
            .ok_or_else(|| Error::parse(line_no, field, "field has no ':' separator"))?;
        if label.is_empty() {
            return Err(Error::parse(line_no, field, "field has an empty label"));
        }

        let value = if options.escapes {
            unescape(value)
        } else {
            Cow::Borrowed(value)
        };

        if record.contains_label(label) {
            debug!(line = line_no, label, "duplicate label");
            match options.duplicate_labels {
                DuplicateLabelPolicy::LastWins => {}
                DuplicateLabelPolicy::FirstWins => continue,
                DuplicateLabelPolicy::Error => {
                    return Err(Error::parse(line_no, field, "duplicate label"));
                }
            }
        }
        record.insert(label.to_string(), value.into_owned());
    }

    Ok(record)
}

/// Decodes `\t`, `\n`, `\r` and `\\`; other backslash sequences stay as written.
pub(crate) fn unescape(value: &str) -> Cow<'_, str> {
    if !value.contains('\\') {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

/// What a single physical line turned into.
#[derive(Debug)]
pub(crate) enum Step {
    Record(Record),
    Skip,
    End,
}

/// Line bookkeeping shared by the blocking and async parsers.
#[derive(Debug, Default)]
pub(crate) struct LineSplitter {
    options: LtsvOptions,
    line: usize,
    finished: bool,
}

impl LineSplitter {
    pub(crate) fn new(options: LtsvOptions) -> Self {
        LineSplitter {
            options,
            line: 0,
            finished: false,
        }
    }

    pub(crate) fn options(&self) -> &LtsvOptions {
        &self.options
    }

    pub(crate) fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consumes the line held in `buf`; `bytes_read == 0` means end of stream.
    pub(crate) fn accept(&mut self, buf: &str, bytes_read: usize) -> Result<Step> {
        if bytes_read == 0 {
            self.finished = true;
            return Ok(Step::End);
        }
        self.line += 1;

        let mut line = buf.strip_suffix('\n').unwrap_or(buf);
        line = line.strip_suffix('\r').unwrap_or(line);
        if self.line == 1 {
            line = line.strip_prefix(BOM).unwrap_or(line);
        }

        let record = parse_line(line, self.line, &self.options)?;
        if record.is_empty() {
            return Ok(match self.options.empty_lines {
                EmptyLinePolicy::Skip => Step::Skip,
                EmptyLinePolicy::EndOfStream => {
                    debug!(line = self.line, "empty line ends the stream");
                    self.finished = true;
                    Step::End
                }
            });
        }

        trace!(line = self.line, fields = record.len(), "parsed record");
        Ok(Step::Record(record))
    }
}

pub(crate) fn closed_stream() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "the LTSV stream has been closed")
}

/// Blocking LTSV parser over any [`BufRead`].
///
/// The stream is owned until [`Parser::close`] (or drop) releases it.
pub struct Parser<R> {
    reader: Option<R>,
    buf: String,
    splitter: LineSplitter,
}

impl<R: BufRead> Parser<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, LtsvOptions::default())
    }

    pub fn with_options(reader: R, options: LtsvOptions) -> Self {
        Parser {
            reader: Some(reader),
            buf: String::new(),
            splitter: LineSplitter::new(options),
        }
    }

    /// Reads the next record, or `None` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for a malformed line and [`Error::Io`] for
    /// stream failures, including reads after [`Parser::close`].
    pub fn read(&mut self) -> Result<Option<Record>> {
        loop {
            if self.splitter.is_finished() {
                return Ok(None);
            }
            let reader = self.reader.as_mut().ok_or_else(closed_stream)?;
            self.buf.clear();
            let n = reader.read_line(&mut self.buf)?;
            match self.splitter.accept(&self.buf, n)? {
                Step::Record(record) => return Ok(Some(record)),
                Step::Skip => continue,
                Step::End => return Ok(None),
            }
        }
    }

    /// 1-based number of the last line consumed.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.splitter.line()
    }

    #[must_use]
    pub fn options(&self) -> &LtsvOptions {
        self.splitter.options()
    }

    /// Releases the underlying stream. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!(line = self.splitter.line(), "closed LTSV stream");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }
}

impl<R: BufRead> Iterator for Parser<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(input: &str, options: LtsvOptions) -> Result<Vec<Record>> {
        Parser::with_options(input.as_bytes(), options).collect()
    }

    #[test]
    fn test_values_keep_extra_colons() {
        let all = records("time:2024-01-15T10:30:00\turl:http://x/\n", LtsvOptions::default())
            .unwrap();
        assert_eq!(all[0].get("time"), Some("2024-01-15T10:30:00"));
        assert_eq!(all[0].get("url"), Some("http://x/"));
    }

    #[test]
    fn test_empty_value_is_allowed() {
        let all = records("a:\tb:2", LtsvOptions::default()).unwrap();
        assert_eq!(all[0].get("a"), Some(""));
        assert_eq!(all[0].get("b"), Some("2"));
    }

    #[test]
    fn test_line_endings() {
        let all = records("a:1\r\nb:2\nc:3", LtsvOptions::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].get("a"), Some("1"));
        assert_eq!(all[2].get("c"), Some("3"));
    }

    #[test]
    fn test_empty_lines_skipped_by_default() {
        let all = records("\na:1\n\n\t\nb:2\n\n", LtsvOptions::default()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_empty_line_ends_stream() {
        let options = LtsvOptions::new().with_empty_lines(EmptyLinePolicy::EndOfStream);
        let mut parser = Parser::with_options("a:1\n\nb:2\n".as_bytes(), options);
        assert!(parser.read().unwrap().is_some());
        assert!(parser.read().unwrap().is_none());
        assert!(parser.read().unwrap().is_none());
    }

    #[test]
    fn test_parse_error_names_line() {
        let mut parser = Parser::new("a:1\nb:2\tnocolon\n".as_bytes());
        parser.read().unwrap();
        match parser.read() {
            Err(Error::Parse { line, field, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(field, "nocolon");
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_label_rejected() {
        assert!(parse_line(":value", 1, &LtsvOptions::default()).is_err());
    }

    #[test]
    fn test_duplicate_policies() {
        let line = "a:1\tb:2\ta:3";
        let last = parse_line(line, 1, &LtsvOptions::default()).unwrap();
        assert_eq!(last.get("a"), Some("3"));
        assert_eq!(last.labels().collect::<Vec<_>>(), vec!["a", "b"]);

        let first = parse_line(
            line,
            1,
            &LtsvOptions::new().with_duplicate_labels(DuplicateLabelPolicy::FirstWins),
        )
        .unwrap();
        assert_eq!(first.get("a"), Some("1"));

        let strict = LtsvOptions::new().with_duplicate_labels(DuplicateLabelPolicy::Error);
        assert!(parse_line(line, 1, &strict).is_err());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\tb\nc\\d\x"), "a\tb\nc\\d\\x");
        assert_eq!(unescape("trailing\\"), "trailing\\");
        assert!(matches!(unescape("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escapes_only_when_enabled() {
        let raw = parse_line(r"msg:a\tb", 1, &LtsvOptions::default()).unwrap();
        assert_eq!(raw.get("msg"), Some(r"a\tb"));

        let decoded = parse_line(r"msg:a\tb", 1, &LtsvOptions::new().with_escapes(true)).unwrap();
        assert_eq!(decoded.get("msg"), Some("a\tb"));
    }

    #[test]
    fn test_bom_stripped_from_first_line() {
        let all = records("\u{feff}a:1\n", LtsvOptions::default()).unwrap();
        assert_eq!(all[0].labels().next(), Some("a"));
    }

    #[test]
    fn test_read_after_close_is_io_error() {
        let mut parser = Parser::new("a:1\n".as_bytes());
        parser.close();
        parser.close();
        assert!(parser.is_closed());
        assert!(parser.read().unwrap_err().is_io());
    }

    #[test]
    fn test_invalid_utf8_is_io_error() {
        let bytes: &[u8] = b"a:\xff\xfe\n";
        let mut parser = Parser::new(bytes);
        assert!(parser.read().unwrap_err().is_io());
    }
}
