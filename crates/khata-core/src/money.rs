//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely, and the
//! `TaxRate` used for GST.
//!
//! ## Why Integer Paise?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    ₹899.99 is stored as 89999                                           │
//! │    Every sum is exact; rounding happens only where GST is applied      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Policy
//! Round half away from zero, at the paise level. It is applied once per
//! invoice line and once more when GST is taken on the subtotal. Nothing is
//! rounded twice.
//!
//! ## Usage
//! ```rust
//! use khata_core::money::Money;
//!
//! let price = Money::from_paise(89_999); // ₹899.99
//! let line = price.checked_mul_quantity(2).unwrap();
//! assert_eq!(line.paise(), 179_998);
//! assert!(price.checked_mul_quantity(i64::MAX).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so the standard 18% GST slab is 1800 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// The 18% GST slab applied when the invoice editor's GST toggle is on.
    pub const GST_STANDARD: TaxRate = TaxRate(1800);

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::GST_STANDARD
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Where Money is Used
/// ```text
/// Product.price_paise ──► InvoiceItem.unit_price ──► InvoiceItem.total
///                                                          │
///                          Invoice.subtotal ◄── sum ───────┘
///                                │
///                                ├──► GST (18%, rounded once)
///                                ▼
///                          Invoice.total
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax on this amount, rounding half away from zero.
    ///
    /// ## Implementation
    /// Integer math in i128: `amount × bps / 10000`, with the remainder
    /// deciding the rounding direction. No float ever touches the amount.
    ///
    /// ## Example
    /// ```rust
    /// use khata_core::money::{Money, TaxRate};
    ///
    /// // ₹1799.98 × 18% = ₹323.9964 → ₹324.00
    /// let tax = Money::from_paise(179_998).calculate_tax(TaxRate::GST_STANDARD);
    /// assert_eq!(tax.paise(), 32_400);
    /// ```
    ///
    /// A result outside the `i64` range saturates; use
    /// [`checked_tax`](Self::checked_tax) where that must be caught.
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.checked_tax(rate).unwrap_or(if self.0 < 0 {
            Money(i64::MIN)
        } else {
            Money(i64::MAX)
        })
    }

    /// Same as [`calculate_tax`](Self::calculate_tax), `None` when the tax
    /// does not fit in an `i64`.
    pub fn checked_tax(&self, rate: TaxRate) -> Option<Money> {
        let scaled = self.0 as i128 * rate.bps() as i128;
        i64::try_from(div_round_half_away(scaled, 10_000))
            .ok()
            .map(Money)
    }

    /// Multiplies money by a quantity. `None` on overflow.
    ///
    /// Quantity and price are both whole numbers, so the product is already
    /// exact at the paise level.
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Parses a rupee amount as typed by a shopkeeper.
    ///
    /// Accepts an optional `₹` sign, thousands separators and at most two
    /// decimal places: `"899.99"`, `"₹1,299"`, `"45.5"`.
    ///
    /// ## Example
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// assert_eq!(Money::parse_rupees("899.99").unwrap().paise(), 89_999);
    /// assert_eq!(Money::parse_rupees("₹1,299").unwrap().paise(), 129_900);
    /// assert!(Money::parse_rupees("12.345").is_err());
    /// assert!(Money::parse_rupees("abc").is_err());
    /// ```
    pub fn parse_rupees(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let cleaned: String = input
            .trim()
            .trim_start_matches('₹')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest.trim()),
            None => (false, cleaned.trim()),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("empty amount"));
        }
        if fraction.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a number"));
        }

        let rupees: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let paise: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("must be a number"))? * 10,
            _ => fraction.parse().map_err(|_| invalid("must be a number"))?,
        };

        let total = rupees
            .checked_mul(100)
            .and_then(|v| v.checked_add(paise))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -total } else { total }))
    }
}

/// Integer division rounding half away from zero. `divisor` must be positive.
fn div_round_half_away(value: i128, divisor: i128) -> i128 {
    let quotient = value / divisor;
    let remainder = value % divisor;
    if remainder.abs() * 2 >= divisor {
        quotient + value.signum()
    } else {
        quotient
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rupee rendering. Localised formatting belongs to the UI.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(89_999);
        assert_eq!(money.paise(), 89_999);
        assert_eq!(money.rupees(), 899);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(1099).to_string(), "₹10.99");
        assert_eq!(Money::from_paise(500).to_string(), "₹5.00");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_gst_on_scenario_subtotal() {
        let tax = Money::from_paise(179_998).calculate_tax(TaxRate::GST_STANDARD);
        assert_eq!(tax.paise(), 32_400);
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 25 × 18% = 4.5 → 5
        assert_eq!(
            Money::from_paise(25).calculate_tax(TaxRate::GST_STANDARD).paise(),
            5
        );
        // 24 × 18% = 4.32 → 4
        assert_eq!(
            Money::from_paise(24).calculate_tax(TaxRate::GST_STANDARD).paise(),
            4
        );
        // -25 × 18% = -4.5 → -5
        assert_eq!(
            Money::from_paise(-25).calculate_tax(TaxRate::GST_STANDARD).paise(),
            -5
        );
    }

    #[test]
    fn test_zero_rate() {
        let tax = Money::from_paise(10_000).calculate_tax(TaxRate::zero());
        assert!(tax.is_zero());
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        assert_eq!(
            Money::from_paise(299).checked_mul_quantity(3),
            Some(Money::from_paise(897))
        );
        assert_eq!(
            Money::from_paise(89_999).checked_mul_quantity(200_000_000_000_000),
            None
        );
        assert_eq!(Money::from_paise(i64::MAX).checked_add(Money::from_paise(1)), None);

        let huge = Money::from_paise(i64::MAX);
        assert_eq!(huge.checked_tax(TaxRate::from_bps(20_000)), None);
        assert_eq!(huge.calculate_tax(TaxRate::from_bps(20_000)).paise(), i64::MAX);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 5]
            .into_iter()
            .map(Money::from_paise)
            .sum();
        assert_eq!(total.paise(), 355);
    }

    #[test]
    fn test_parse_rupees() {
        assert_eq!(Money::parse_rupees("899.99").unwrap().paise(), 89_999);
        assert_eq!(Money::parse_rupees("45.5").unwrap().paise(), 4_550);
        assert_eq!(Money::parse_rupees(" ₹1,299 ").unwrap().paise(), 129_900);
        assert_eq!(Money::parse_rupees(".75").unwrap().paise(), 75);
        assert_eq!(Money::parse_rupees("-10").unwrap().paise(), -1_000);

        assert!(Money::parse_rupees("").is_err());
        assert!(Money::parse_rupees("12.345").is_err());
        assert!(Money::parse_rupees("1e5").is_err());
        assert!(Money::parse_rupees("99999999999999999999").is_err());
    }
}
