//! # Money Module
//!
//! Dual-currency amounts: local francs (`Fc`) and US dollars (`Usd`), plus the
//! `ExchangeRate` that converts between them.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    1 250 FC / 2500 = 0.5 USD      (fine)                               │
//! │    0.1 + 0.2 = 0.30000000000000004 (not fine, anywhere)                │
//! │                                                                         │
//! │  OUR SOLUTION:                                                          │
//! │    Fc  = whole francs (i64): the authoritative amount                  │
//! │    Usd = US cents (i64): always derived through ExchangeRate           │
//! │    Conversion uses i128 integer division with explicit rounding        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use resto_core::money::{ExchangeRate, Fc};
//!
//! let rate = ExchangeRate::DEFAULT;       // 2500 FC per USD
//! let price = Fc::new(12_500);
//! assert_eq!(rate.to_usd(price).cents(), 500); // $5.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Local Currency
// =============================================================================

/// An amount in local currency, in whole francs.
///
/// The franc has no minor unit in circulation, so the smallest unit is one
/// franc. Negative values are allowed (change due, refunds).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Fc(i64);

impl Fc {
    /// Creates an amount from whole francs.
    #[inline]
    pub const fn new(francs: i64) -> Self {
        Fc(francs)
    }

    /// Returns the amount in whole francs.
    #[inline]
    pub const fn francs(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Fc(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity (line totals).
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Fc(self.0 * qty)
    }

    /// `None` when the sum leaves the `i64` range.
    #[inline]
    pub const fn checked_add(&self, other: Fc) -> Option<Fc> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Fc(sum)),
            None => None,
        }
    }
}

/// Formats as `12 500 FC` (space as thousands separator).
impl fmt::Display for Fc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{} FC", sign, group_thousands(self.0.unsigned_abs()))
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

impl Add for Fc {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Fc(self.0 + other.0)
    }
}

impl AddAssign for Fc {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Fc {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Fc(self.0 - other.0)
    }
}

impl SubAssign for Fc {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Fc {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Fc(self.0 * qty)
    }
}

// =============================================================================
// US Dollars
// =============================================================================

/// An amount in US dollars, stored in cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Usd(i64);

impl Usd {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Usd(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Usd(0)
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the amount as a two-decimal string without symbol (`"5.00"`).
    pub fn as_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Usd {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Usd(self.0 + other.0)
    }
}

impl Sub for Usd {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Usd(self.0 - other.0)
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Francs per US dollar.
///
/// ## Rounding
/// `to_usd` reproduces `round(fc / rate, 2)` with half-away-from-zero
/// rounding, in integer arithmetic. With the default rate of 2500 and whole
/// francs there are no exact ties, so the result never depends on the
/// tie-breaking rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(try_from = "i64", into = "i64")]
pub struct ExchangeRate(i64);

impl ExchangeRate {
    /// 2500 FC = 1 USD.
    pub const DEFAULT: ExchangeRate = ExchangeRate(2500);

    /// Creates a rate; it must be strictly positive.
    pub fn new(francs_per_usd: i64) -> Result<Self, ValidationError> {
        if francs_per_usd <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "exchange_rate".to_string(),
            });
        }
        Ok(ExchangeRate(francs_per_usd))
    }

    #[inline]
    pub const fn francs_per_usd(&self) -> i64 {
        self.0
    }

    /// Converts francs to US cents, saturating at the `i64` bounds.
    ///
    /// ```rust
    /// use resto_core::money::{ExchangeRate, Fc};
    ///
    /// let rate = ExchangeRate::DEFAULT;
    /// assert_eq!(rate.to_usd(Fc::new(1_000)).cents(), 40);  // 0.40 USD
    /// assert_eq!(rate.to_usd(Fc::new(1_234)).cents(), 49);  // 0.4936 → 0.49
    /// assert_eq!(rate.to_usd(Fc::new(-1_234)).cents(), -49);
    /// ```
    pub fn to_usd(&self, amount: Fc) -> Usd {
        Usd(saturate(div_round_half_away(
            amount.francs() as i128 * 100,
            self.0 as i128,
        )))
    }

    /// Converts US cents to whole francs, saturating at the `i64` bounds.
    pub fn to_fc(&self, amount: Usd) -> Fc {
        Fc(saturate(self.fc_wide(amount)))
    }

    /// Converts US cents to whole francs; `None` when the result does not
    /// fit in an `i64`.
    ///
    /// ```rust
    /// use resto_core::money::{ExchangeRate, Usd};
    ///
    /// let rate = ExchangeRate::DEFAULT;
    /// assert_eq!(rate.checked_to_fc(Usd::from_cents(500)).map(|fc| fc.francs()), Some(12_500));
    /// assert_eq!(rate.checked_to_fc(Usd::from_cents(i64::MAX)), None);
    /// ```
    pub fn checked_to_fc(&self, amount: Usd) -> Option<Fc> {
        i64::try_from(self.fc_wide(amount)).ok().map(Fc)
    }

    fn fc_wide(&self, amount: Usd) -> i128 {
        div_round_half_away(amount.cents() as i128 * self.0 as i128, 100)
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        ExchangeRate::DEFAULT
    }
}

impl TryFrom<i64> for ExchangeRate {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        ExchangeRate::new(value)
    }
}

impl From<ExchangeRate> for i64 {
    fn from(rate: ExchangeRate) -> Self {
        rate.0
    }
}

pub(crate) fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Integer division rounding half away from zero. `d` must be positive.
pub(crate) fn div_round_half_away(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if 2 * r.abs() >= d {
        q + n.signum()
    } else {
        q
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fc_display_groups_thousands() {
        assert_eq!(Fc::new(0).to_string(), "0 FC");
        assert_eq!(Fc::new(950).to_string(), "950 FC");
        assert_eq!(Fc::new(12_500).to_string(), "12 500 FC");
        assert_eq!(Fc::new(1_234_567).to_string(), "1 234 567 FC");
        assert_eq!(Fc::new(-2_500).to_string(), "-2 500 FC");
    }

    #[test]
    fn test_usd_display() {
        assert_eq!(Usd::from_cents(500).to_string(), "$5.00");
        assert_eq!(Usd::from_cents(-49).to_string(), "-$0.49");
        assert_eq!(Usd::from_cents(1234).as_decimal_string(), "12.34");
    }

    #[test]
    fn test_default_rate_conversions() {
        let rate = ExchangeRate::DEFAULT;
        assert_eq!(rate.to_usd(Fc::new(2_500)).cents(), 100);
        assert_eq!(rate.to_usd(Fc::new(12_500)).cents(), 500);
        assert_eq!(rate.to_usd(Fc::new(13)).cents(), 1); // 0.0052 → 0.01
        assert_eq!(rate.to_usd(Fc::new(12)).cents(), 0); // 0.0048 → 0.00
        assert_eq!(rate.to_fc(Usd::from_cents(500)).francs(), 12_500);
    }

    #[test]
    fn test_rate_must_be_positive() {
        assert!(ExchangeRate::new(0).is_err());
        assert!(ExchangeRate::new(-1).is_err());
        assert_eq!(ExchangeRate::new(2800).unwrap().francs_per_usd(), 2800);
    }

    #[test]
    fn test_rate_serde_rejects_zero() {
        let parsed: Result<ExchangeRate, _> = serde_json::from_str("0");
        assert!(parsed.is_err());
        let parsed: ExchangeRate = serde_json::from_str("2500").unwrap();
        assert_eq!(parsed, ExchangeRate::DEFAULT);
    }

    #[test]
    fn test_ties_round_away_from_zero() {
        // rate 200: 1 FC = 0.5 cent exactly
        let rate = ExchangeRate::new(200).unwrap();
        assert_eq!(rate.to_usd(Fc::new(1)).cents(), 1);
        assert_eq!(rate.to_usd(Fc::new(-1)).cents(), -1);
    }

    #[test]
    fn test_conversions_never_wrap() {
        let rate = ExchangeRate::DEFAULT;
        assert_eq!(rate.checked_to_fc(Usd::from_cents(i64::MAX / 10)), None);
        assert_eq!(rate.to_fc(Usd::from_cents(i64::MAX / 10)), Fc::new(i64::MAX));
        assert_eq!(rate.to_fc(Usd::from_cents(i64::MIN)), Fc::new(i64::MIN));

        let one = ExchangeRate::new(1).unwrap();
        assert_eq!(one.to_usd(Fc::new(i64::MAX)), Usd::from_cents(i64::MAX));
    }

    #[test]
    fn test_fc_checked_add() {
        assert_eq!(Fc::new(1).checked_add(Fc::new(2)), Some(Fc::new(3)));
        assert_eq!(Fc::new(i64::MAX).checked_add(Fc::new(1)), None);
    }

    proptest! {
        #[test]
        fn to_usd_matches_float_rounding(fc in 0i64..1_000_000_000) {
            let expected = ((fc as f64 / 2500.0) * 100.0).round() as i64;
            prop_assert_eq!(ExchangeRate::DEFAULT.to_usd(Fc::new(fc)).cents(), expected);
        }

        #[test]
        fn to_usd_is_odd(fc in -1_000_000_000i64..1_000_000_000) {
            let rate = ExchangeRate::DEFAULT;
            prop_assert_eq!(rate.to_usd(Fc::new(-fc)).cents(), -rate.to_usd(Fc::new(fc)).cents());
        }
    }
}
