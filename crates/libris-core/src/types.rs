//! # Domain Types
//!
//! Core domain types used throughout Libris.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Borrower     │   │      Loan       │   │      Fine       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  class          │   │  borrower_id    │   │  loan_id (1:1)  │       │
//! │  │  is_active      │   │  item_id        │   │  amount         │       │
//! │  └─────────────────┘   │  borrowed_at    │   │  status         │       │
//! │                        │  due_at         │   └─────────────────┘       │
//! │  ┌─────────────────┐   │  returned_at?   │                             │
//! │  │      Item       │   │  status (view)  │   ┌─────────────────┐       │
//! │  │  ─────────────  │   └─────────────────┘   │ BorrowerClass   │       │
//! │  │  available      │                         │  Standard       │       │
//! │  │  total          │                         │  Privileged     │       │
//! │  └─────────────────┘                         │  Staff          │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Facts vs. Views
//! A loan persists only facts (`borrowed_at`, `due_at`, `returned_at`).
//! `Loan::status` is a projection recomputed from those facts and "now";
//! nothing ever writes `Overdue` back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LoanError;
use crate::money::Money;

// =============================================================================
// Borrower Class
// =============================================================================

/// The policy bundle a borrower is registered under.
///
/// Assigned at registration and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum BorrowerClass {
    /// Regular members (students).
    Standard,
    /// Members with extended privileges (faculty).
    Privileged,
    /// Library staff.
    Staff,
}

impl BorrowerClass {
    pub const ALL: [BorrowerClass; 3] = [
        BorrowerClass::Standard,
        BorrowerClass::Privileged,
        BorrowerClass::Staff,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            BorrowerClass::Standard => "standard",
            BorrowerClass::Privileged => "privileged",
            BorrowerClass::Staff => "staff",
        }
    }
}

impl fmt::Display for BorrowerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BorrowerClass {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(BorrowerClass::Standard),
            "privileged" => Ok(BorrowerClass::Privileged),
            "staff" => Ok(BorrowerClass::Staff),
            other => Err(LoanError::UnknownClass(other.to_string())),
        }
    }
}

// =============================================================================
// Borrower & Item
// =============================================================================

/// A registered library member, as seen by the borrower directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Borrower {
    pub id: String,
    pub name: String,
    pub class: BorrowerClass,
    pub is_active: bool,
}

/// A catalog entry with its copy counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    pub id: String,
    pub title: String,
    pub available_copies: u32,
    pub total_copies: u32,
}

impl Item {
    /// Checks if at least one copy is on the shelf.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Copies currently out on loan.
    #[inline]
    pub fn copies_on_loan(&self) -> u32 {
        self.total_copies.saturating_sub(self.available_copies)
    }
}

// =============================================================================
// Loan Status
// =============================================================================

/// Lifecycle state of a loan.
///
/// ```text
///   Active ──(now > due_at)──► Overdue      (projection, never stored)
///     │                          │
///     └──────(return)────────────┴──► Returned   (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Overdue,
    Returned,
}

impl LoanStatus {
    /// Projects the status from the stored facts of a loan.
    pub fn project(
        due_at: DateTime<Utc>,
        returned_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> LoanStatus {
        match returned_at {
            Some(_) => LoanStatus::Returned,
            None if now > due_at => LoanStatus::Overdue,
            None => LoanStatus::Active,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
        }
    }
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Active
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Loan
// =============================================================================

/// One borrowing of one item by one borrower.
///
/// `borrower_class` is a snapshot of the class resolved at borrow time, so
/// fine assessment never depends on the directory again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Loan {
    pub id: String,
    pub borrower_id: String,
    pub item_id: String,
    pub borrower_class: BorrowerClass,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    /// Projected from the fields above; see [`Loan::refresh_status`].
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub status: LoanStatus,
}

impl Loan {
    #[inline]
    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    /// Recomputes `status` for the given instant.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) {
        self.status = LoanStatus::project(self.due_at, self.returned_at, now);
    }

    /// Returns a copy with `status` projected for the given instant.
    pub fn projected(mut self, now: DateTime<Utc>) -> Loan {
        self.refresh_status(now);
        self
    }

    /// Checks the date invariants every stored loan must satisfy.
    ///
    /// ## Rules
    /// - `due_at > borrowed_at`
    /// - `returned_at >= borrowed_at` when present
    pub fn check_invariants(&self) -> Result<(), LoanError> {
        if self.due_at <= self.borrowed_at {
            return Err(LoanError::invariant(format!(
                "loan {} is due at or before it was borrowed",
                self.id
            )));
        }

        if let Some(returned_at) = self.returned_at {
            if returned_at < self.borrowed_at {
                return Err(LoanError::invariant(format!(
                    "loan {} was returned before it was borrowed",
                    self.id
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Fine Status
// =============================================================================

/// Settlement state of a fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum FineStatus {
    Pending,
    Paid,
    Waived,
}

impl FineStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FineStatus::Pending => "pending",
            FineStatus::Paid => "paid",
            FineStatus::Waived => "waived",
        }
    }
}

impl Default for FineStatus {
    fn default() -> Self {
        FineStatus::Pending
    }
}

impl fmt::Display for FineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Fine
// =============================================================================

/// Penalty assessed against an overdue loan. At most one per loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Fine {
    pub id: String,
    pub loan_id: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "amount_cents"))]
    pub amount: Money,
    pub status: FineStatus,
    pub assessed_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

impl Fine {
    /// Marks a pending fine as paid.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> Result<(), LoanError> {
        self.ensure_pending()?;
        self.status = FineStatus::Paid;
        self.paid_at = Some(now);
        Ok(())
    }

    /// Waives a pending fine, recording the reason in `remarks`.
    pub fn waive(&mut self, reason: impl Into<String>) -> Result<(), LoanError> {
        self.ensure_pending()?;
        self.status = FineStatus::Waived;
        self.remarks = Some(reason.into());
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), LoanError> {
        if self.status != FineStatus::Pending {
            return Err(LoanError::FineNotPending {
                fine_id: self.id.clone(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Catalog Instructions
// =============================================================================

/// Change to an item's availability that the caller must apply in the same
/// transaction as the loan write it accompanies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AvailabilityChange {
    Decrement { item_id: String },
    Increment { item_id: String },
}

impl AvailabilityChange {
    pub fn item_id(&self) -> &str {
        match self {
            AvailabilityChange::Decrement { item_id } | AvailabilityChange::Increment { item_id } => {
                item_id
            }
        }
    }

    /// Signed change in available copies.
    pub fn delta(&self) -> i64 {
        match self {
            AvailabilityChange::Decrement { .. } => -1,
            AvailabilityChange::Increment { .. } => 1,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn sample_loan() -> Loan {
        Loan {
            id: "loan-1".to_string(),
            borrower_id: "STU-1".to_string(),
            item_id: "BK-1".to_string(),
            borrower_class: BorrowerClass::Standard,
            borrowed_at: t0(),
            due_at: t0() + Duration::days(14),
            returned_at: None,
            status: LoanStatus::Active,
        }
    }

    fn sample_fine() -> Fine {
        Fine {
            id: "fine-1".to_string(),
            loan_id: "loan-1".to_string(),
            amount: Money::from_cents(1500),
            status: FineStatus::Pending,
            assessed_at: t0(),
            paid_at: None,
            remarks: Some("Overdue by 3 days".to_string()),
        }
    }

    #[test]
    fn test_class_parse_and_display() {
        assert_eq!(
            "Privileged".parse::<BorrowerClass>().unwrap(),
            BorrowerClass::Privileged
        );
        assert_eq!(BorrowerClass::Staff.to_string(), "staff");
        let err = "visitor".parse::<BorrowerClass>().unwrap_err();
        assert!(matches!(err, LoanError::UnknownClass(tag) if tag == "visitor"));
    }

    #[test]
    fn test_status_projection() {
        let due = t0();
        assert_eq!(
            LoanStatus::project(due, None, due - Duration::hours(1)),
            LoanStatus::Active
        );
        // Exactly at the due instant the loan is not yet overdue
        assert_eq!(LoanStatus::project(due, None, due), LoanStatus::Active);
        assert_eq!(
            LoanStatus::project(due, None, due + Duration::seconds(1)),
            LoanStatus::Overdue
        );
        assert_eq!(
            LoanStatus::project(due, Some(due + Duration::days(9)), due + Duration::days(30)),
            LoanStatus::Returned
        );
    }

    #[test]
    fn test_loan_refresh_status() {
        let loan = sample_loan().projected(t0() + Duration::days(15));
        assert_eq!(loan.status, LoanStatus::Overdue);
    }

    #[test]
    fn test_loan_invariants() {
        assert!(sample_loan().check_invariants().is_ok());

        let mut bad = sample_loan();
        bad.due_at = bad.borrowed_at;
        assert!(bad.check_invariants().unwrap_err().is_fatal());

        let mut bad = sample_loan();
        bad.returned_at = Some(bad.borrowed_at - Duration::minutes(1));
        assert!(bad.check_invariants().is_err());
    }

    #[test]
    fn test_fine_mark_paid() {
        let mut fine = sample_fine();
        let paid_at = t0() + Duration::days(1);
        fine.mark_paid(paid_at).unwrap();
        assert_eq!(fine.status, FineStatus::Paid);
        assert_eq!(fine.paid_at, Some(paid_at));

        // Paying twice is refused
        let err = fine.mark_paid(paid_at).unwrap_err();
        assert!(matches!(err, LoanError::FineNotPending { .. }));
    }

    #[test]
    fn test_fine_waive() {
        let mut fine = sample_fine();
        fine.waive("Book damaged in flood, not borrower's fault").unwrap();
        assert_eq!(fine.status, FineStatus::Waived);
        assert_eq!(
            fine.remarks.as_deref(),
            Some("Book damaged in flood, not borrower's fault")
        );
        assert!(fine.mark_paid(t0()).is_err());
    }

    #[test]
    fn test_item_availability() {
        let item = Item {
            id: "BK-1".to_string(),
            title: "Clean Code".to_string(),
            available_copies: 0,
            total_copies: 2,
        };
        assert!(!item.is_available());
        assert_eq!(item.copies_on_loan(), 2);
    }

    #[test]
    fn test_availability_change() {
        let change = AvailabilityChange::Decrement {
            item_id: "BK-1".to_string(),
        };
        assert_eq!(change.item_id(), "BK-1");
        assert_eq!(change.delta(), -1);
    }
}
