//! Arbitrary-precision decimal numbers.
//!
//! [`Decimal`] stores an integer mantissa ([`BigInt`]) and a base-10 scale, so
//! `12.50` is `1250 × 10⁻²`. Values compare equal regardless of trailing
//! zeros.
//!
//! Two parsers are offered:
//!
//! - [`str::parse`] (`FromStr`): strict `[+-]digits[.digits]`
//! - [`Decimal::parse_invariant`]: culture-invariant and lenient, accepting
//!   surrounding whitespace and `,` group separators in the integer part
//!
//! ## Examples
//!
//! ```rust
//! use ltsv_helper::Decimal;
//!
//! let strict: Decimal = "1234.50".parse().unwrap();
//! let lenient = Decimal::parse_invariant(" 1,234.5 ").unwrap();
//! assert_eq!(strict, lenient);
//! assert_eq!(lenient.to_string(), "1234.5");
//! assert!("1,234.5".parse::<Decimal>().is_err());
//! ```

use num_bigint::{BigInt, Sign};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A decimal number with an arbitrary-precision mantissa.
#[derive(Clone, Debug, Default)]
pub struct Decimal {
    mantissa: BigInt,
    scale: u32,
}

/// Error returned by the strict [`FromStr`] parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal: {0:?}")]
pub struct ParseDecimalError(String);

impl Decimal {
    /// Creates a decimal from a mantissa and a scale: `mantissa × 10^-scale`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ltsv_helper::Decimal;
    ///
    /// let d = Decimal::new(-1250, 2);
    /// assert_eq!(d.to_string(), "-12.50");
    /// ```
    #[must_use]
    pub fn new(mantissa: impl Into<BigInt>, scale: u32) -> Self {
        Decimal {
            mantissa: mantissa.into(),
            scale,
        }
    }

    #[must_use]
    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    #[must_use]
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Removes trailing fractional zeros.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ltsv_helper::Decimal;
    ///
    /// assert_eq!(Decimal::new(1200, 3).normalize().to_string(), "1.2");
    /// ```
    #[must_use]
    pub fn normalize(&self) -> Self {
        let ten = BigInt::from(10);
        let zero = BigInt::from(0);
        let mut mantissa = self.mantissa.clone();
        let mut scale = self.scale;
        while scale > 0 && &mantissa % &ten == zero {
            mantissa /= &ten;
            scale -= 1;
        }
        Decimal { mantissa, scale }
    }

    /// Lenient, culture-invariant parse that never fails loudly.
    ///
    /// Accepts surrounding whitespace, a leading sign, `,` group separators
    /// before the decimal point and `.` as the decimal point. Returns `None`
    /// for anything else.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ltsv_helper::Decimal;
    ///
    /// assert!(Decimal::parse_invariant("-1,000,000.25").is_some());
    /// assert!(Decimal::parse_invariant("abc").is_none());
    /// assert!(Decimal::parse_invariant("1.2.3").is_none());
    /// ```
    #[must_use]
    pub fn parse_invariant(s: &str) -> Option<Self> {
        parse_digits(s.trim(), true)
    }

    /// Approximates this value as an `f64`.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    fn rescaled(&self, scale: u32) -> BigInt {
        &self.mantissa * BigInt::from(10).pow(scale - self.scale)
    }
}

fn parse_digits(s: &str, allow_groups: bool) -> Option<Decimal> {
    let (negative, body) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };

    let mut digits = String::with_capacity(body.len());
    for (idx, ch) in int_part.char_indices() {
        match ch {
            '0'..='9' => digits.push(ch),
            ',' if allow_groups && idx > 0 => {}
            _ => return None,
        }
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.push_str(frac_part);
    if digits.is_empty() {
        return None;
    }

    let magnitude = BigInt::parse_bytes(digits.as_bytes(), 10)?;
    let mantissa = if negative { -magnitude } else { magnitude };
    Some(Decimal {
        mantissa,
        scale: u32::try_from(frac_part.len()).ok()?,
    })
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_digits(s, false).ok_or_else(|| ParseDecimalError(s.to_string()))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.magnitude().to_str_radix(10);
        let sign = if self.mantissa.sign() == Sign::Minus {
            "-"
        } else {
            ""
        };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        let scale = self.scale.max(other.scale);
        self.rescaled(scale) == other.rescaled(scale)
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let scale = self.scale.max(other.scale);
        self.rescaled(scale).cmp(&other.rescaled(scale))
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(value, 0)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
