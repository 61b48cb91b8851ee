//! Writing raw records back to LTSV.
//!
//! This is the inverse of [`parse_line`](crate::parser::parse_line): fields
//! are written as `label:value` in record order, joined by tabs, one record
//! per line. Nothing is converted; values are written exactly as stored.
//!
//! ## Examples
//!
//! ```rust
//! use ltsv_helper::{ser::to_line, LtsvOptions, Record};
//!
//! let record: Record = [("host", "::1"), ("path", "/")].into_iter().collect();
//! assert_eq!(to_line(&record, &LtsvOptions::default()).unwrap(), "host:::1\tpath:/");
//! ```

use crate::{Error, LtsvOptions, Record, Result};
use std::io;

fn check_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(Error::unrepresentable("label", label, "labels cannot be empty"));
    }
    if label.contains([':', '\t', '\n', '\r']) {
        return Err(Error::unrepresentable(
            "label",
            label,
            "labels cannot contain ':', tab or line breaks",
        ));
    }
    Ok(())
}

fn push_value(out: &mut String, value: &str, escapes: bool) -> Result<()> {
    if !escapes {
        if value.contains(['\t', '\n', '\r']) {
            return Err(Error::unrepresentable(
                "value",
                value,
                "tab and line breaks need escapes enabled",
            ));
        }
        out.push_str(value);
        return Ok(());
    }

    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    Ok(())
}

/// Formats one record as a line, without the trailing newline.
///
/// # Errors
///
/// Returns [`Error::Unrepresentable`] for a label or value that would not
/// parse back to the same record.
pub fn to_line(record: &Record, options: &LtsvOptions) -> Result<String> {
    let mut out = String::with_capacity(record.iter().map(|(l, v)| l.len() + v.len() + 2).sum());
    for (i, (label, value)) in record.iter().enumerate() {
        check_label(label)?;
        if i > 0 {
            out.push('\t');
        }
        out.push_str(label);
        out.push(':');
        push_value(&mut out, value, options.escapes)?;
    }
    Ok(out)
}

/// Formats records as LTSV text, one newline-terminated line each.
///
/// # Errors
///
/// See [`to_line`].
pub fn to_string<'a, I>(records: I, options: &LtsvOptions) -> Result<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut out = String::new();
    for record in records {
        out.push_str(&to_line(record, options)?);
        out.push('\n');
    }
    Ok(out)
}

/// Writes records to an [`io::Write`].
pub struct LtsvWriter<W> {
    writer: W,
    options: LtsvOptions,
}

impl<W: io::Write> LtsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, LtsvOptions::default())
    }

    pub fn with_options(writer: W, options: LtsvOptions) -> Self {
        LtsvWriter { writer, options }
    }

    /// Writes one record followed by `\n`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unrepresentable`] before anything is written, or
    /// [`Error::Io`] if the writer fails.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let mut line = to_line(record, &self.options)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
