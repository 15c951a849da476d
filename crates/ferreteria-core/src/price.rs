//! # Price Module
//!
//! Fixed-point prices with two fractional digits, held as integer cents.
//!
//! ## Representation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Wire / user text        Price (cents)          Storage                 │
//! │                                                                         │
//! │  "15.00"  ──parse──►     Price(1500)   ──────►  sale_price_cents 1500   │
//! │  15.5     ──parse──►     Price(1550)                                    │
//! │  "15.001" ──parse──►     ✗ more than two fractional digits              │
//! │                                                                         │
//! │  Price(1500) ──Display──► "15.00"                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ferreteria_core::price::Price;
//!
//! let purchase: Price = "10.00".parse().unwrap();
//! let sale = Price::from_cents(1500);
//!
//! assert_eq!(sale.to_string(), "15.00");
//! assert!(sale.markup_within(purchase, 10));
//! assert_eq!(sale.markup_bps(purchase), 5000); // 50.00%
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Mul, Sub};
use std::str::FromStr;

// =============================================================================
// Bounds
// =============================================================================

/// Smallest accepted price: 0.01
pub const MIN_PRICE: Price = Price(1);

/// Largest accepted price: 999,999.99
pub const MAX_PRICE: Price = Price(99_999_999);

/// Upper bound for `(sale - purchase) / purchase`.
pub const MAX_MARKUP_RATIO: i64 = 10;

// =============================================================================
// Price Type
// =============================================================================

/// A price in cents.
///
/// Signed so that differences (`sale - purchase`) stay in the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    /// Creates a price from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Price(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole units portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Fractional portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// True if the price lies within [`MIN_PRICE`, `MAX_PRICE`].
    #[inline]
    pub fn in_range(&self) -> bool {
        *self >= MIN_PRICE && *self <= MAX_PRICE
    }

    /// Checks `(self - purchase) / purchase <= max_ratio` exactly.
    ///
    /// Integer form: `self - purchase <= max_ratio * purchase`, so no
    /// rounding is involved. A non-positive purchase price never passes.
    pub fn markup_within(&self, purchase: Price, max_ratio: i64) -> bool {
        if purchase.0 <= 0 {
            return false;
        }
        let diff = self.0 as i128 - purchase.0 as i128;
        diff <= max_ratio as i128 * purchase.0 as i128
    }

    /// Markup over `purchase` in basis points, rounded half-up.
    ///
    /// ## Example
    /// ```rust
    /// use ferreteria_core::price::Price;
    ///
    /// let sale = Price::from_cents(1500);
    /// let purchase = Price::from_cents(1000);
    /// assert_eq!(sale.markup_bps(purchase), 5000);
    /// ```
    ///
    /// Returns 0 when `purchase` is not positive.
    pub fn markup_bps(&self, purchase: Price) -> i64 {
        if purchase.0 <= 0 {
            return 0;
        }
        let diff = self.0 as i128 - purchase.0 as i128;
        let scaled = diff * 10_000;
        let p = purchase.0 as i128;
        // half-up on magnitude
        let rounded = if scaled >= 0 {
            (scaled + p / 2) / p
        } else {
            -((-scaled + p / 2) / p)
        };
        rounded as i64
    }

    /// Multiplies by a stock quantity (inventory valuation).
    ///
    /// Saturates at the `i64` limits instead of overflowing.
    #[inline]
    pub const fn times(&self, qty: i64) -> Price {
        Price(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Why a price string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceParseError {
    #[error("price is empty")]
    Empty,

    #[error("price '{0}' is not a decimal number")]
    NotANumber(String),

    #[error("price '{0}' has more than two decimal places")]
    TooPrecise(String),

    #[error("price '{0}' is too large")]
    Overflow(String),
}

impl FromStr for Price {
    type Err = PriceParseError;

    /// Parses `"15"`, `"15.5"`, `"15.50"`, `"-3.25"`. Exponents are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceParseError::Empty);
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(PriceParseError::NotANumber(s.to_string()));
        }

        // "15.500" is still exact
        let frac = frac.trim_end_matches('0');
        if frac.len() > 2 {
            return Err(PriceParseError::TooPrecise(s.to_string()));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| PriceParseError::Overflow(s.to_string()))?
        };
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(|| PriceParseError::Overflow(s.to_string()))?;

        Ok(Price(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Sub for Price {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Price(self.0 - other.0)
    }
}

impl Mul<i64> for Price {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.times(qty)
    }
}

/// Serialized as a fixed-point string (`"15.00"`) so no client sees a float.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepts `"15.00"`, `15.5` or `15`.
impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl<'de> Visitor<'de> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal price with at most two fractional digits")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        v.checked_mul(100)
            .map(Price)
            .ok_or_else(|| E::custom(PriceParseError::Overflow(v.to_string())))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Price)
            .ok_or_else(|| E::custom(PriceParseError::Overflow(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        if !v.is_finite() {
            return Err(E::custom(PriceParseError::NotANumber(v.to_string())));
        }
        // shortest round-trip text, so 19.99 stays "19.99"
        v.to_string().parse().map_err(E::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
