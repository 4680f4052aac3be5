//! # Fine Calculator
//!
//! Turns days overdue into a penalty using a profile's grace period and
//! progressive rate.
//!
//! ## Algorithm
//! ```text
//! days_overdue ≤ 0                       → 0
//! chargeable = max(0, days - grace)      → 0 if chargeable == 0
//! chargeable ≤ threshold                 → chargeable × base
//! otherwise                              → threshold × base
//!                                          + (chargeable - threshold) × base × multiplier
//! ```
//!
//! ## Worked Example
//! ```text
//! Privileged: grace 3, base 10.00, threshold 14, multiplier 2.0×
//! 20 days overdue → 17 chargeable
//!   14 × 10.00            = 140.00
//!    3 × 10.00 × 2.0      =  60.00
//!                           ──────
//!                           200.00
//! ```
//!
//! Total over every integer input: negative day counts yield zero and
//! amounts saturate at `Money::MAX` instead of overflowing.

use serde::Serialize;

use crate::money::Money;
use crate::policy::PolicyProfile;

/// How a fine amount was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FineBreakdown {
    pub days_overdue: i64,
    /// Days overdue minus the grace period, floored at zero.
    pub chargeable_days: i64,
    /// Portion charged at the base rate.
    pub base_portion: Money,
    /// Portion charged at the increased rate beyond the threshold.
    pub progressive_portion: Money,
    pub total: Money,
}

/// Days overdue minus the grace period, floored at zero.
pub fn chargeable_days(days_overdue: i64, profile: &PolicyProfile) -> i64 {
    if days_overdue <= 0 {
        return 0;
    }
    (days_overdue - i64::from(profile.grace_period_days())).max(0)
}

/// Computes the fine with its base and progressive portions.
pub fn fine_breakdown(days_overdue: i64, profile: &PolicyProfile) -> FineBreakdown {
    let chargeable = chargeable_days(days_overdue, profile);
    let threshold = i64::from(profile.progressive_threshold_days());
    let base = profile.base_daily_penalty();

    let (base_portion, progressive_portion) = if chargeable <= threshold {
        (base.multiply_days(chargeable), Money::zero())
    } else {
        // Multiplier applied to the whole excess, rounded once
        let excess = chargeable - threshold;
        (
            base.multiply_days(threshold),
            base.multiply_days(excess)
                .scale(profile.progressive_multiplier()),
        )
    };

    FineBreakdown {
        days_overdue: days_overdue.max(0),
        chargeable_days: chargeable,
        base_portion,
        progressive_portion,
        total: base_portion.saturating_add(progressive_portion),
    }
}

/// Computes the penalty for `days_overdue` under `profile`.
///
/// ```rust
/// use libris_core::fine::calculate_fine;
/// use libris_core::money::{Money, RateMultiplier};
/// use libris_core::policy::PolicyProfile;
///
/// let profile = PolicyProfile::new(
///     3, 14, 0, Money::from_cents(500), 7, RateMultiplier::from_bps(15_000),
/// ).unwrap();
/// // 7 × 5.00 + 3 × 7.50
/// assert_eq!(calculate_fine(10, &profile).cents(), 5750);
/// ```
pub fn calculate_fine(days_overdue: i64, profile: &PolicyProfile) -> Money {
    fine_breakdown(days_overdue, profile).total
}

// =============================================================================
// Unit Tests
// =============================================================================
