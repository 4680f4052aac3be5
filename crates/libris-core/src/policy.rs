//! # Policy Profiles
//!
//! One immutable [`PolicyProfile`] per [`BorrowerClass`], looked up through a
//! [`PolicyTable`].
//!
//! ## Canonical Table
//! ```text
//! ┌────────────┬───────┬──────┬───────┬──────────┬───────────┬────────────┐
//! │ Class      │ Limit │ Days │ Grace │ Base/day │ Threshold │ Multiplier │
//! ├────────────┼───────┼──────┼───────┼──────────┼───────────┼────────────┤
//! │ Standard   │     3 │   14 │     0 │     5.00 │         7 │       1.5× │
//! │ Privileged │    10 │   30 │     3 │    10.00 │        14 │       2.0× │
//! │ Staff      │    50 │   90 │     0 │     0.00 │         0 │       1.0× │
//! └────────────┴───────┴──────┴───────┴──────────┴───────────┴────────────┘
//! ```
//!
//! Deployments can replace any row through configuration; overrides go
//! through the same validation as [`PolicyProfile::new`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreResult, LoanError, ValidationError};
use crate::money::{Money, RateMultiplier};
use crate::types::BorrowerClass;
use crate::validation::{
    validate_multiplier_bps, validate_penalty_cents, validate_positive, ValidationResult,
};

// =============================================================================
// Policy Profile
// =============================================================================

/// The complete set of borrowing parameters for one borrower class.
///
/// Fields are private and fixed at construction. Serialises as the flat
/// configuration shape (`*_cents`, `*_bps`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProfileFields", into = "ProfileFields")]
pub struct PolicyProfile {
    max_active_loans: u32,
    loan_duration_days: u32,
    grace_period_days: u32,
    base_daily_penalty: Money,
    progressive_threshold_days: u32,
    progressive_multiplier: RateMultiplier,
}

impl PolicyProfile {
    /// Builds a validated profile.
    ///
    /// ## Rules
    /// - `max_active_loans > 0`, `loan_duration_days > 0`
    /// - `base_daily_penalty >= 0`
    /// - `progressive_multiplier >= 1.0×`
    ///
    /// ```rust
    /// use libris_core::money::{Money, RateMultiplier};
    /// use libris_core::policy::PolicyProfile;
    ///
    /// let profile = PolicyProfile::new(
    ///     3, 14, 0, Money::from_cents(500), 7, RateMultiplier::from_bps(15_000),
    /// ).unwrap();
    /// assert_eq!(profile.loan_duration_days(), 14);
    /// ```
    pub fn new(
        max_active_loans: u32,
        loan_duration_days: u32,
        grace_period_days: u32,
        base_daily_penalty: Money,
        progressive_threshold_days: u32,
        progressive_multiplier: RateMultiplier,
    ) -> ValidationResult<Self> {
        validate_positive("max_active_loans", max_active_loans)?;
        validate_positive("loan_duration_days", loan_duration_days)?;
        validate_penalty_cents(base_daily_penalty.cents())?;
        validate_multiplier_bps(progressive_multiplier.bps())?;

        Ok(PolicyProfile {
            max_active_loans,
            loan_duration_days,
            grace_period_days,
            base_daily_penalty,
            progressive_threshold_days,
            progressive_multiplier,
        })
    }

    const fn canonical(
        max_active_loans: u32,
        loan_duration_days: u32,
        grace_period_days: u32,
        base_daily_penalty_cents: i64,
        progressive_threshold_days: u32,
        progressive_multiplier_bps: u32,
    ) -> Self {
        PolicyProfile {
            max_active_loans,
            loan_duration_days,
            grace_period_days,
            base_daily_penalty: Money::from_cents(base_daily_penalty_cents),
            progressive_threshold_days,
            progressive_multiplier: RateMultiplier::from_bps(progressive_multiplier_bps),
        }
    }

    /// Returns the canonical profile for a class.
    pub const fn for_class(class: BorrowerClass) -> Self {
        match class {
            BorrowerClass::Standard => STANDARD,
            BorrowerClass::Privileged => PRIVILEGED,
            BorrowerClass::Staff => STAFF,
        }
    }

    #[inline]
    pub const fn max_active_loans(&self) -> u32 {
        self.max_active_loans
    }

    #[inline]
    pub const fn loan_duration_days(&self) -> u32 {
        self.loan_duration_days
    }

    #[inline]
    pub const fn grace_period_days(&self) -> u32 {
        self.grace_period_days
    }

    #[inline]
    pub const fn base_daily_penalty(&self) -> Money {
        self.base_daily_penalty
    }

    /// Chargeable days after which the progressive rate applies.
    #[inline]
    pub const fn progressive_threshold_days(&self) -> u32 {
        self.progressive_threshold_days
    }

    #[inline]
    pub const fn progressive_multiplier(&self) -> RateMultiplier {
        self.progressive_multiplier
    }
}

const STANDARD: PolicyProfile = PolicyProfile::canonical(3, 14, 0, 500, 7, 15_000);
const PRIVILEGED: PolicyProfile = PolicyProfile::canonical(10, 30, 3, 1_000, 14, 20_000);
const STAFF: PolicyProfile = PolicyProfile::canonical(50, 90, 0, 0, 0, 10_000);

/// Flat on-disk shape of a profile, as written in configuration files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileFields {
    pub max_active_loans: u32,
    pub loan_duration_days: u32,
    #[serde(default)]
    pub grace_period_days: u32,
    pub base_daily_penalty_cents: i64,
    #[serde(default)]
    pub progressive_threshold_days: u32,
    #[serde(default = "default_multiplier_bps")]
    pub progressive_multiplier_bps: u32,
}

fn default_multiplier_bps() -> u32 {
    RateMultiplier::ONE.bps()
}

impl TryFrom<ProfileFields> for PolicyProfile {
    type Error = ValidationError;

    fn try_from(raw: ProfileFields) -> Result<Self, Self::Error> {
        PolicyProfile::new(
            raw.max_active_loans,
            raw.loan_duration_days,
            raw.grace_period_days,
            Money::from_cents(raw.base_daily_penalty_cents),
            raw.progressive_threshold_days,
            RateMultiplier::from_bps(raw.progressive_multiplier_bps),
        )
    }
}

impl From<PolicyProfile> for ProfileFields {
    fn from(profile: PolicyProfile) -> Self {
        ProfileFields {
            max_active_loans: profile.max_active_loans,
            loan_duration_days: profile.loan_duration_days,
            grace_period_days: profile.grace_period_days,
            base_daily_penalty_cents: profile.base_daily_penalty.cents(),
            progressive_threshold_days: profile.progressive_threshold_days,
            progressive_multiplier_bps: profile.progressive_multiplier.bps(),
        }
    }
}

// =============================================================================
// Policy Table (resolver)
// =============================================================================

/// Maps each borrower class to its profile. Pure lookup, no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    profiles: HashMap<BorrowerClass, PolicyProfile>,
}

impl PolicyTable {
    /// A table with no profiles; every lookup fails until rows are added.
    pub fn empty() -> Self {
        PolicyTable {
            profiles: HashMap::new(),
        }
    }

    /// Replaces (or adds) the profile for one class.
    pub fn with_profile(mut self, class: BorrowerClass, profile: PolicyProfile) -> Self {
        self.profiles.insert(class, profile);
        self
    }

    /// Resolves the profile for a class.
    ///
    /// Fails with `UnknownClass` only when the table has no row for the
    /// class, which a complete table never produces.
    pub fn resolve(&self, class: BorrowerClass) -> CoreResult<&PolicyProfile> {
        self.profiles
            .get(&class)
            .ok_or_else(|| LoanError::UnknownClass(class.to_string()))
    }

    /// Resolves a profile from a textual class tag.
    pub fn resolve_tag(&self, tag: &str) -> CoreResult<&PolicyProfile> {
        let class: BorrowerClass = tag.parse()?;
        self.resolve(class)
    }

    /// Iterates over the configured rows in class order.
    pub fn iter(&self) -> impl Iterator<Item = (BorrowerClass, &PolicyProfile)> {
        let mut rows: Vec<_> = self.profiles.iter().map(|(c, p)| (*c, p)).collect();
        rows.sort_by_key(|(class, _)| *class);
        rows.into_iter()
    }
}

impl Default for PolicyTable {
    /// The canonical table for every class.
    fn default() -> Self {
        BorrowerClass::ALL
            .iter()
            .fold(PolicyTable::empty(), |table, class| {
                table.with_profile(*class, PolicyProfile::for_class(*class))
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_rows() {
        let table = PolicyTable::default();

        let standard = table.resolve(BorrowerClass::Standard).unwrap();
        assert_eq!(standard.max_active_loans(), 3);
        assert_eq!(standard.loan_duration_days(), 14);
        assert_eq!(standard.grace_period_days(), 0);
        assert_eq!(standard.base_daily_penalty().cents(), 500);
        assert_eq!(standard.progressive_threshold_days(), 7);
        assert_eq!(standard.progressive_multiplier().bps(), 15_000);

        let privileged = table.resolve(BorrowerClass::Privileged).unwrap();
        assert_eq!(privileged.max_active_loans(), 10);
        assert_eq!(privileged.grace_period_days(), 3);
        assert_eq!(privileged.progressive_threshold_days(), 14);

        let staff = table.resolve(BorrowerClass::Staff).unwrap();
        assert_eq!(staff.loan_duration_days(), 90);
        assert!(staff.base_daily_penalty().is_zero());
    }

    #[test]
    fn test_canonical_rows_pass_validation() {
        for class in BorrowerClass::ALL {
            let p = PolicyProfile::for_class(class);
            let rebuilt = PolicyProfile::new(
                p.max_active_loans(),
                p.loan_duration_days(),
                p.grace_period_days(),
                p.base_daily_penalty(),
                p.progressive_threshold_days(),
                p.progressive_multiplier(),
            )
            .unwrap();
            assert_eq!(rebuilt, p);
        }
    }

    #[test]
    fn test_new_rejects_bad_numbers() {
        let base = Money::from_cents(500);
        let mult = RateMultiplier::from_bps(15_000);
        assert!(PolicyProfile::new(0, 14, 0, base, 7, mult).is_err());
        assert!(PolicyProfile::new(3, 0, 0, base, 7, mult).is_err());
        assert!(PolicyProfile::new(3, 14, 0, Money::from_cents(-1), 7, mult).is_err());
        assert!(PolicyProfile::new(3, 14, 0, base, 7, RateMultiplier::from_bps(5_000)).is_err());
    }

    #[test]
    fn test_missing_row_is_unknown_class() {
        let table = PolicyTable::empty().with_profile(
            BorrowerClass::Standard,
            PolicyProfile::for_class(BorrowerClass::Standard),
        );
        let err = table.resolve(BorrowerClass::Staff).unwrap_err();
        assert!(matches!(err, LoanError::UnknownClass(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_resolve_tag() {
        let table = PolicyTable::default();
        assert_eq!(
            table.resolve_tag("privileged").unwrap().max_active_loans(),
            10
        );
        assert!(matches!(
            table.resolve_tag("alumni"),
            Err(LoanError::UnknownClass(_))
        ));
    }

    #[test]
    fn test_override_replaces_row() {
        let stricter = PolicyProfile::new(
            1,
            7,
            0,
            Money::from_cents(800),
            5,
            RateMultiplier::from_bps(20_000),
        )
        .unwrap();
        let table = PolicyTable::default().with_profile(BorrowerClass::Standard, stricter);
        assert_eq!(
            table.resolve(BorrowerClass::Standard).unwrap().max_active_loans(),
            1
        );
        assert_eq!(table.iter().count(), 3);
    }

    #[test]
    fn test_deserialize_flat_shape() {
        let json = r#"{
            "max_active_loans": 5,
            "loan_duration_days": 21,
            "grace_period_days": 2,
            "base_daily_penalty_cents": 250,
            "progressive_threshold_days": 10,
            "progressive_multiplier_bps": 12500
        }"#;
        let profile: PolicyProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.max_active_loans(), 5);
        assert_eq!(profile.base_daily_penalty().cents(), 250);
        assert_eq!(profile.progressive_multiplier().bps(), 12_500);

        let out = serde_json::to_value(profile).unwrap();
        assert_eq!(out["progressive_multiplier_bps"], 12_500);
    }

    #[test]
    fn test_deserialize_rejects_invalid_profile() {
        let json = r#"{
            "max_active_loans": 0,
            "loan_duration_days": 21,
            "base_daily_penalty_cents": 250
        }"#;
        assert!(serde_json::from_str::<PolicyProfile>(json).is_err());
    }
}
