//! # Loan Lifecycle Engine
//!
//! Decides borrows and returns, assesses fines and reports overdue loans.
//!
//! ## State Machine
//! ```text
//!            borrow()
//!               │
//!               ▼
//!         ┌──────────┐   now > due_at   ┌──────────┐
//!         │  Active  │ ───────────────► │ Overdue  │   (projection only)
//!         └────┬─────┘                  └────┬─────┘
//!              │        return_item()        │
//!              └──────────────┬──────────────┘
//!                             ▼
//!                       ┌──────────┐
//!                       │ Returned │   (terminal)
//!                       └──────────┘
//! ```
//!
//! ## Reads and Writes
//! The engine reads through the [`Catalog`], [`BorrowerDirectory`] and
//! [`LoanLedger`] traits and never writes anything. Each decision comes back
//! as an outcome holding the new or updated records plus an
//! [`AvailabilityChange`]; the caller applies all of it in one transaction.
//!
//! ```text
//! borrow request
//!      │
//!      ▼
//! ┌─────────────┐  ┌──────────────┐  ┌─────────────┐  ┌─────────────┐
//! │ borrower?   │─►│ item?        │─►│ copy free?  │─►│ can_borrow? │
//! │ NotFound    │  │ NotFound     │  │ Unavailable │  │ Inactive /  │
//! └─────────────┘  └──────────────┘  └─────────────┘  │ LimitReached│
//!                                                     └──────┬──────┘
//!                                                            ▼
//!                                          BorrowOutcome { loan, Decrement }
//! ```

use chrono::Duration;
use serde::Serialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::eligibility::{can_borrow_with, Eligibility};
use crate::error::{CoreResult, LoanError};
use crate::fine::{fine_breakdown, FineBreakdown};
use crate::policy::{PolicyProfile, PolicyTable};
use crate::types::{AvailabilityChange, Borrower, Fine, FineStatus, Item, Loan, LoanStatus};
use crate::validation::validate_entity_id;

// =============================================================================
// Collaborators
// =============================================================================

/// Read access to item records.
pub trait Catalog {
    fn item(&self, item_id: &str) -> Option<Item>;
}

/// Read access to borrower records.
pub trait BorrowerDirectory {
    fn borrower(&self, borrower_id: &str) -> Option<Borrower>;

    /// Loans of this borrower with no return date, overdue ones included.
    fn count_active_loans(&self, borrower_id: &str) -> u32;
}

/// Read access to recorded loans and fines.
pub trait LoanLedger {
    fn loan(&self, loan_id: &str) -> Option<Loan>;

    fn fine_for_loan(&self, loan_id: &str) -> Option<Fine>;
}

// =============================================================================
// Outcomes
// =============================================================================

/// A granted borrow: the loan to insert and the decrement to apply with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorrowOutcome {
    pub loan: Loan,
    pub change: AvailabilityChange,
}

/// Whether a fine was just assessed or had already been recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "assessment", content = "fine", rename_all = "snake_case")]
pub enum FineAssessment {
    /// Freshly assessed; the caller must store it.
    New(Fine),
    /// Already on record; nothing to store.
    Existing(Fine),
}

impl FineAssessment {
    pub fn fine(&self) -> &Fine {
        match self {
            FineAssessment::New(fine) | FineAssessment::Existing(fine) => fine,
        }
    }

    pub fn into_fine(self) -> Fine {
        match self {
            FineAssessment::New(fine) | FineAssessment::Existing(fine) => fine,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, FineAssessment::New(_))
    }
}

/// A completed return: the updated loan, the increment, and any fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnOutcome {
    pub loan: Loan,
    pub change: AvailabilityChange,
    pub fine: Option<FineAssessment>,
}

/// What a loan would cost if it were settled right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FineQuote {
    pub loan_id: String,
    pub breakdown: FineBreakdown,
}

// =============================================================================
// Engine
// =============================================================================

/// Stateless lending decisions over a policy table and a clock.
///
/// Safe to share between threads; every mutable fact lives with the
/// collaborators.
#[derive(Debug, Clone)]
pub struct LoanEngine<C: Clock> {
    policies: PolicyTable,
    clock: C,
}

impl<C: Clock> LoanEngine<C> {
    pub fn new(policies: PolicyTable, clock: C) -> Self {
        LoanEngine { policies, clock }
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    // -------------------------------------------------------------------------
    // Borrow
    // -------------------------------------------------------------------------

    /// Decides a borrow request.
    ///
    /// ## Checks (in order)
    /// 1. Borrower exists and has a policy profile
    /// 2. Item exists
    /// 3. Item has an available copy
    /// 4. Borrower is active and below the class limit
    ///
    /// `directory.count_active_loans` is read here, so the caller's
    /// transaction must already be open.
    pub fn borrow(
        &self,
        directory: &impl BorrowerDirectory,
        catalog: &impl Catalog,
        borrower_id: &str,
        item_id: &str,
    ) -> CoreResult<BorrowOutcome> {
        validate_entity_id("borrower_id", borrower_id)?;
        validate_entity_id("item_id", item_id)?;

        let borrower = directory
            .borrower(borrower_id)
            .ok_or_else(|| LoanError::BorrowerNotFound(borrower_id.to_string()))?;
        let profile = *self.policies.resolve(borrower.class)?;

        let item = catalog
            .item(item_id)
            .ok_or_else(|| LoanError::ItemNotFound(item_id.to_string()))?;
        if !item.is_available() {
            return Err(LoanError::Unavailable {
                item_id: item.id,
            });
        }

        let active = directory.count_active_loans(&borrower.id);
        if !can_borrow_with(&borrower, active, &profile) {
            return Err(if !borrower.is_active {
                LoanError::InactiveBorrower(borrower.id)
            } else {
                LoanError::LimitReached {
                    borrower_id: borrower.id,
                    active,
                    max: profile.max_active_loans(),
                }
            });
        }

        let now = self.clock.now();
        let loan = Loan {
            id: Uuid::new_v4().to_string(),
            borrower_id: borrower.id,
            item_id: item.id.clone(),
            borrower_class: borrower.class,
            borrowed_at: now,
            due_at: now + Duration::days(i64::from(profile.loan_duration_days())),
            returned_at: None,
            status: LoanStatus::Active,
        };
        loan.check_invariants()?;

        Ok(BorrowOutcome {
            loan,
            change: AvailabilityChange::Decrement { item_id: item.id },
        })
    }

    // -------------------------------------------------------------------------
    // Return
    // -------------------------------------------------------------------------

    /// Decides a return.
    ///
    /// Overdue days are measured at the return instant. A fine already on
    /// record is handed back unchanged; otherwise a fine is assessed when
    /// the penalty is above zero.
    pub fn return_item<L, K>(&self, ledger: &L, catalog: &K, loan_id: &str) -> CoreResult<ReturnOutcome>
    where
        L: LoanLedger,
        K: Catalog,
    {
        validate_entity_id("loan_id", loan_id)?;

        let mut loan = ledger
            .loan(loan_id)
            .ok_or_else(|| LoanError::LoanNotFound(loan_id.to_string()))?;
        if loan.is_returned() {
            return Err(LoanError::AlreadyReturned(loan.id));
        }

        let item = catalog
            .item(&loan.item_id)
            .ok_or_else(|| LoanError::ItemNotFound(loan.item_id.clone()))?;
        if item.available_copies >= item.total_copies {
            return Err(LoanError::invariant(format!(
                "returning loan {} would raise item {} above its {} copies",
                loan.id, item.id, item.total_copies
            )));
        }

        let now = self.clock.now();
        let days = self.days_overdue_at(&loan, now);

        loan.returned_at = Some(now);
        loan.refresh_status(now);
        loan.check_invariants()?;

        let fine = match ledger.fine_for_loan(&loan.id) {
            Some(existing) => Some(FineAssessment::Existing(existing)),
            None => self
                .new_fine(&loan, days, now)?
                .map(FineAssessment::New),
        };

        Ok(ReturnOutcome {
            change: AvailabilityChange::Increment {
                item_id: loan.item_id.clone(),
            },
            loan,
            fine,
        })
    }

    // -------------------------------------------------------------------------
    // Fines
    // -------------------------------------------------------------------------

    /// Assesses the fine for a loan outside of a return.
    ///
    /// Returns the recorded fine if there is one, a new fine if the loan is
    /// overdue now and the penalty is above zero, `None` otherwise.
    pub fn assess_fine(
        &self,
        ledger: &impl LoanLedger,
        loan_id: &str,
    ) -> CoreResult<Option<FineAssessment>> {
        validate_entity_id("loan_id", loan_id)?;

        let loan = ledger
            .loan(loan_id)
            .ok_or_else(|| LoanError::LoanNotFound(loan_id.to_string()))?;

        if let Some(existing) = ledger.fine_for_loan(&loan.id) {
            return Ok(Some(FineAssessment::Existing(existing)));
        }

        // A returned loan stopped accruing when it came back.
        let now = self.clock.now();
        let days = self.days_overdue_at(&loan, loan.returned_at.unwrap_or(now));
        Ok(self.new_fine(&loan, days, now)?.map(FineAssessment::New))
    }

    /// What the loan would be fined if assessed now. Creates nothing.
    pub fn quote_fine(&self, loan: &Loan) -> CoreResult<FineQuote> {
        let profile = self.policies.resolve(loan.borrower_class)?;
        let days = self.days_overdue(loan);
        Ok(FineQuote {
            loan_id: loan.id.clone(),
            breakdown: fine_breakdown(days, profile),
        })
    }

    fn new_fine(
        &self,
        loan: &Loan,
        days: i64,
        now: chrono::DateTime<chrono::Utc>,
    ) -> CoreResult<Option<Fine>> {
        if days <= 0 {
            return Ok(None);
        }

        let profile: &PolicyProfile = self.policies.resolve(loan.borrower_class)?;
        let amount = fine_breakdown(days, profile).total;
        if amount.is_zero() {
            return Ok(None);
        }

        Ok(Some(Fine {
            id: Uuid::new_v4().to_string(),
            loan_id: loan.id.clone(),
            amount,
            status: FineStatus::Pending,
            assessed_at: now,
            paid_at: None,
            remarks: Some(format!("Overdue by {days} days")),
        }))
    }

    // -------------------------------------------------------------------------
    // Projections
    // -------------------------------------------------------------------------

    /// Whole days past due, or 0 unless the loan is currently overdue.
    pub fn days_overdue(&self, loan: &Loan) -> i64 {
        if loan.is_returned() {
            return 0;
        }
        self.days_overdue_at(loan, self.clock.now())
    }

    fn days_overdue_at(&self, loan: &Loan, at: chrono::DateTime<chrono::Utc>) -> i64 {
        if LoanStatus::project(loan.due_at, None, at) != LoanStatus::Overdue {
            return 0;
        }
        (at - loan.due_at).num_days().max(0)
    }

    /// The loan with its status projected for now.
    pub fn project(&self, loan: Loan) -> Loan {
        loan.projected(self.clock.now())
    }

    /// Unreturned loans past their due date, earliest due first.
    pub fn list_overdue<I>(&self, loans: I) -> Vec<Loan>
    where
        I: IntoIterator<Item = Loan>,
    {
        let now = self.clock.now();
        let mut overdue: Vec<Loan> = loans
            .into_iter()
            .map(|loan| loan.projected(now))
            .filter(|loan| loan.status == LoanStatus::Overdue)
            .collect();
        overdue.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.id.cmp(&b.id)));
        overdue
    }

    /// The borrower's standing, counted fresh from the directory.
    pub fn eligibility(
        &self,
        directory: &impl BorrowerDirectory,
        borrower_id: &str,
    ) -> CoreResult<Eligibility> {
        validate_entity_id("borrower_id", borrower_id)?;

        let borrower = directory
            .borrower(borrower_id)
            .ok_or_else(|| LoanError::BorrowerNotFound(borrower_id.to_string()))?;
        let active = directory.count_active_loans(&borrower.id);
        Eligibility::evaluate(&self.policies, &borrower, active)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
