//! # Money Module
//!
//! Provides the `Money` type for fine amounts and the `RateMultiplier` used by
//! progressive penalty schedules.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:                                                           │
//! │    3 days × 5.00 × 1.5 = 22.499999999999996  ❌ WRONG!                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer cents + basis-point multipliers                  │
//! │    3 × 500 cents = 1500 cents                                           │
//! │    1500 × 15000 bps / 10000 = 2250 cents = 22.50  ✅                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use libris_core::money::{Money, RateMultiplier};
//!
//! let base = Money::from_cents(500); // 5.00 per day
//! let week = base.multiply_days(7);  // 35.00
//! assert_eq!(week.cents(), 3500);
//!
//! let surcharged = base.scale(RateMultiplier::from_bps(15_000)); // 1.5×
//! assert_eq!(surcharged.cents(), 750);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// PolicyProfile.base_daily_penalty ──► calculate_fine() ──► Fine.amount
///                                                              │
///                                        FineSummary totals ◄──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use libris_core::money::Money;
    ///
    /// let fine = Money::from_cents(5750);
    /// assert_eq!(fine.cents(), 5750);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ```rust
    /// use libris_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(57, 50).cents(), 5750);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// The largest representable amount; saturated arithmetic stops here.
    pub const MAX: Money = Money(i64::MAX);

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a daily amount by a number of days, saturating at the
    /// bounds of `i64`.
    ///
    /// ```rust
    /// use libris_core::money::Money;
    ///
    /// let daily = Money::from_cents(1000);
    /// assert_eq!(daily.multiply_days(14).cents(), 14_000);
    /// assert_eq!(daily.multiply_days(i64::MAX), Money::MAX);
    /// ```
    #[inline]
    pub const fn multiply_days(&self, days: i64) -> Self {
        Money(self.0.saturating_mul(days))
    }

    /// Adds two amounts, saturating at the bounds of `i64`.
    #[inline]
    pub const fn saturating_add(&self, other: Money) -> Self {
        Money(self.0.saturating_add(other.0))
    }

    /// Applies a basis-point multiplier, rounding half up to the nearest cent.
    ///
    /// ## Implementation
    /// Integer math only: `(amount * bps + 5000) / 10000`, widened to i128 so
    /// long overdue periods cannot overflow the intermediate product.
    ///
    /// ```rust
    /// use libris_core::money::{Money, RateMultiplier};
    ///
    /// let amount = Money::from_cents(333);
    /// // 333 × 1.5 = 499.5 → 500
    /// assert_eq!(amount.scale(RateMultiplier::from_bps(15_000)).cents(), 500);
    /// ```
    pub fn scale(&self, multiplier: RateMultiplier) -> Money {
        let scaled = (self.0 as i128 * multiplier.bps() as i128 + 5000) / 10000;
        Money::from_cents(scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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
// Rate Multiplier
// =============================================================================

/// A rate multiplier in basis points of the base rate.
///
/// ## Why Basis Points?
/// 10 000 bps = 1.0× (no increase), 15 000 bps = 1.5×, 20 000 bps = 2.0×.
/// Keeps progressive penalty schedules in integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RateMultiplier(u32);

impl RateMultiplier {
    /// The identity multiplier (1.0×).
    pub const ONE: RateMultiplier = RateMultiplier(10_000);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        RateMultiplier(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Whether the multiplier leaves the base rate unchanged.
    #[inline]
    pub const fn is_identity(&self) -> bool {
        self.0 == Self::ONE.0
    }
}

impl Default for RateMultiplier {
    fn default() -> Self {
        RateMultiplier::ONE
    }
}

impl fmt::Display for RateMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}x", self.0 / 10_000, self.0 % 10_000)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(5750);
        assert_eq!(money.cents(), 5750);
        assert_eq!(money.major(), 57);
        assert_eq!(money.minor(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(5750).to_string(), "57.50");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_scale_exact() {
        let base = Money::from_cents(500);
        assert_eq!(base.scale(RateMultiplier::from_bps(15_000)).cents(), 750);
        assert_eq!(base.scale(RateMultiplier::ONE).cents(), 500);
        assert_eq!(
            Money::from_cents(1000)
                .scale(RateMultiplier::from_bps(20_000))
                .cents(),
            2000
        );
    }

    #[test]
    fn test_scale_rounds_half_up() {
        // 1 cent × 1.5 = 1.5 → 2
        assert_eq!(
            Money::from_cents(1)
                .scale(RateMultiplier::from_bps(15_000))
                .cents(),
            2
        );
        // 1 cent × 1.25 = 1.25 → 1
        assert_eq!(
            Money::from_cents(1)
                .scale(RateMultiplier::from_bps(12_500))
                .cents(),
            1
        );
    }

    #[test]
    fn test_scale_large_amount_does_not_overflow() {
        let big = Money::from_cents(i64::MAX / 4);
        let scaled = big.scale(RateMultiplier::from_bps(20_000));
        assert_eq!(scaled.cents(), (i64::MAX / 4) * 2);
    }

    #[test]
    fn test_scale_saturates_instead_of_truncating() {
        let scaled = Money::MAX.scale(RateMultiplier::from_bps(20_000));
        assert_eq!(scaled, Money::MAX);

        let daily = Money::from_cents(500);
        assert_eq!(daily.multiply_days(i64::MAX), Money::MAX);
        assert_eq!(daily.saturating_add(Money::MAX), Money::MAX);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 650]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), 1000);
    }

    #[test]
    fn test_multiplier_display() {
        assert_eq!(RateMultiplier::from_bps(15_000).to_string(), "1.5000x");
        assert!(RateMultiplier::default().is_identity());
    }
}
