//! The LTSV format as read by this crate.
//!
//! # Overview
//!
//! LTSV (Labeled Tab-Separated Values) stores one record per line. A record is
//! a tab-separated list of fields and each field is a label and a value
//! separated by a colon:
//!
//! ```text
//! host:127.0.0.1<TAB>time:[10/Oct/2000:13:55:36 -0700]<TAB>status:200
//! ```
//!
//! It is common for access logs, where every line carries its own column
//! names and new columns can be added without breaking readers.
//!
//! # Lines
//!
//! - A line ends at `\n` or `\r\n`; the last line may lack a terminator
//! - A UTF-8 byte-order mark at the start of the stream is ignored
//! - A line with no fields is skipped, or ends the stream under
//!   [`EmptyLinePolicy::EndOfStream`](crate::EmptyLinePolicy::EndOfStream)
//!
//! # Fields
//!
//! | Input | Label | Value |
//! |-------|-------|-------|
//! | `status:200` | `status` | `200` |
//! | `time:10:30:00` | `time` | `10:30:00` (split on the first colon) |
//! | `referer:` | `referer` | empty string |
//! | `:oops` | | parse error (empty label) |
//! | `oops` | | parse error (no colon) |
//!
//! Empty fields produced by doubled or trailing tabs are ignored.
//!
//! # Duplicate labels
//!
//! Governed by [`DuplicateLabelPolicy`](crate::DuplicateLabelPolicy):
//! last value wins by default (keeping the position of the first occurrence),
//! first value wins, or the line is rejected.
//!
//! # Escapes
//!
//! The base format has no escaping: a value cannot hold a tab or a line break.
//! With [`LtsvOptions::with_escapes`](crate::LtsvOptions::with_escapes) the
//! reader decodes and the writer produces:
//!
//! ```text
//! \t  - tab
//! \n  - line feed
//! \r  - carriage return
//! \\  - backslash
//! ```
//!
//! Any other backslash sequence is kept as written.
//!
//! # Limitations
//!
//! - Labels are not validated beyond being non-empty and colon-free
//! - A whole line must fit in memory

// This module contains only documentation; no implementation code
