//! Parser options for LTSV reading and writing.
//!
//! This module provides types to customize how lines are split into records:
//!
//! - [`LtsvOptions`]: Main configuration struct
//! - [`EmptyLinePolicy`]: What an empty line means
//! - [`DuplicateLabelPolicy`]: What happens when a label repeats on one line
//!
//! ## Examples
//!
//! ```rust
//! use ltsv_helper::{DuplicateLabelPolicy, EmptyLinePolicy, LtsvOptions};
//!
//! let options = LtsvOptions::new()
//!     .with_empty_lines(EmptyLinePolicy::EndOfStream)
//!     .with_duplicate_labels(DuplicateLabelPolicy::Error)
//!     .with_escapes(true);
//! assert!(options.escapes);
//! ```

/// What the parser does with a line that holds no fields.
///
/// # Examples
///
/// ```rust
/// use ltsv_helper::{EmptyLinePolicy, LtsvReader, LtsvOptions};
///
/// let input = "a:1\n\nb:2\n";
/// let options = LtsvOptions::new().with_empty_lines(EmptyLinePolicy::EndOfStream);
/// let mut reader = LtsvReader::with_options(input.as_bytes(), options);
/// assert!(reader.read().unwrap());
/// assert!(!reader.read().unwrap());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EmptyLinePolicy {
    /// Skip the line and continue with the next one
    #[default]
    Skip,
    /// Treat the line as the end of the stream
    EndOfStream,
}

/// How a label that appears more than once on a line is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DuplicateLabelPolicy {
    /// The later value replaces the earlier one, keeping the first position
    #[default]
    LastWins,
    /// The first value is kept and later ones are ignored
    FirstWins,
    /// The line is rejected with a parse error
    Error,
}

/// Configuration options for the LTSV parser and writer.
///
/// # Examples
///
/// ```rust
/// use ltsv_helper::LtsvOptions;
///
/// let options = LtsvOptions::default();
/// assert!(!options.escapes);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LtsvOptions {
    pub empty_lines: EmptyLinePolicy,
    pub duplicate_labels: DuplicateLabelPolicy,
    /// Decode `\t`, `\n`, `\r` and `\\` inside values (and encode them when writing)
    pub escapes: bool,
}

impl LtsvOptions {
    /// Creates default options (skip empty lines, last label wins, no escapes).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the empty line policy.
    #[must_use]
    pub fn with_empty_lines(mut self, policy: EmptyLinePolicy) -> Self {
        self.empty_lines = policy;
        self
    }

    /// Sets the duplicate label policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ltsv_helper::{DuplicateLabelPolicy, LtsvOptions, LtsvReader};
    ///
    /// let options = LtsvOptions::new().with_duplicate_labels(DuplicateLabelPolicy::FirstWins);
    /// let mut reader = LtsvReader::with_options("a:1\ta:2\n".as_bytes(), options);
    /// reader.read().unwrap();
    /// assert_eq!(reader.get_field("a").unwrap(), "1");
    /// ```
    #[must_use]
    pub fn with_duplicate_labels(mut self, policy: DuplicateLabelPolicy) -> Self {
        self.duplicate_labels = policy;
        self
    }

    /// Enables or disables backslash escapes in values.
    #[must_use]
    pub fn with_escapes(mut self, escapes: bool) -> Self {
        self.escapes = escapes;
        self
    }
}
