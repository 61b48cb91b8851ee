//! Ordered record type for parsed LTSV lines.
//!
//! A [`Record`] wraps an [`IndexMap`] so labels iterate in the order they
//! appeared on the line. Records are produced by the parser and handed out
//! read-only; the only way to build one by hand is [`FromIterator`] or
//! [`Record::insert`], which is what the writer and tests use.
//!
//! ## Examples
//!
//! ```rust
//! use ltsv_helper::Record;
//!
//! let record: Record = [("host", "127.0.0.1"), ("status", "200")]
//!     .into_iter()
//!     .collect();
//!
//! assert_eq!(record.get("status"), Some("200"));
//! let labels: Vec<_> = record.labels().collect();
//! assert_eq!(labels, vec!["host", "status"]);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One parsed line: labels mapped to their raw values, in line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, String>);

impl Record {
    /// Creates an empty `Record`.
    #[must_use]
    pub fn new() -> Self {
        Record(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Record(IndexMap::with_capacity(capacity))
    }

    /// Inserts a field, returning the previous value of the label if any.
    ///
    /// A replaced label keeps its original position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ltsv_helper::Record;
    ///
    /// let mut record = Record::new();
    /// assert!(record.insert("a".to_string(), "1".to_string()).is_none());
    /// assert_eq!(record.insert("a".to_string(), "2".to_string()).as_deref(), Some("1"));
    /// ```
    pub fn insert(&mut self, label: String, value: String) -> Option<String> {
        self.0.insert(label, value)
    }

    /// Returns the raw value of a label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0.get(label).map(String::as_str)
    }

    #[must_use]
    pub fn contains_label(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the labels, in line order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns an iterator over `(label, value)` pairs, in line order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<Record> for HashMap<String, String> {
    fn from(record: Record) -> Self {
        record.0.into_iter().collect()
    }
}

impl IntoIterator for Record {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Record(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
