//! # Lending Service
//!
//! The transaction boundary around [`LoanEngine`]. Every decision runs as:
//!
//! ```text
//! BEGIN IMMEDIATE   takes the write lock, queueing behind other writers
//!   │
//!   ├── load snapshot   borrower + fresh active-loan count + item
//!   │                   (or loan + its fine + its item)
//!   │
//!   ├── engine decides  pure, no I/O; Err → rollback, nothing written
//!   │
//!   ├── apply outcome   insert loan / mark returned / insert fine
//!   │                   guarded availability UPDATE
//!   │
//! commit()
//! ```
//!
//! Decisions hold the write lock for their whole read-decide-write span, so
//! concurrent borrows are applied one after another and each one counts the
//! loans its predecessors committed. Two borrows can never both claim the
//! last copy or the borrower's last slot. The guarded `UPDATE`s catch the
//! same race a second time. A writer that waits longer than `busy_timeout`
//! fails with `DbError::TransactionFailed`.
//!
//! ## Logging
//! Refusals are expected outcomes and log at `debug`/`info`. Only
//! `InvariantViolation` and `UnknownClass` log at `error`.

use std::sync::Arc;

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use libris_core::validation::{validate_entity_id, validate_reason};
use libris_core::{
    AvailabilityChange, BorrowOutcome, Borrower, BorrowerDirectory, Catalog, Clock, Eligibility,
    Fine, FineAssessment, FineQuote, Item, Loan, LoanEngine, LoanError, LoanLedger, PolicyTable,
    ReturnOutcome,
};

use crate::error::DbError;
use crate::repository::{
    BorrowerRepository, FineRepository, FineSummary, ItemRepository, LoanRepository,
};

// =============================================================================
// Errors
// =============================================================================

/// Why a lending operation did not complete.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The engine refused the request (or found corrupted state).
    #[error(transparent)]
    Rejected(#[from] LoanError),

    /// Storage failed; the transaction was rolled back.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Db(DbError::from(err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Logs a refusal at the level its kind deserves.
fn rejected(operation: &'static str, err: LoanError) -> ServiceError {
    if err.is_fatal() {
        error!(operation, error = %err, "Lending invariant broken");
    } else {
        info!(operation, reason = %err, "Lending request refused");
    }
    ServiceError::Rejected(err)
}

// =============================================================================
// Snapshot
// =============================================================================

/// The rows one decision needs, read inside the open transaction.
#[derive(Debug, Default)]
struct Snapshot {
    borrower: Option<Borrower>,
    active_loans: u32,
    item: Option<Item>,
    loan: Option<Loan>,
    fine: Option<Fine>,
}

impl Catalog for Snapshot {
    fn item(&self, item_id: &str) -> Option<Item> {
        self.item.clone().filter(|item| item.id == item_id)
    }
}

impl BorrowerDirectory for Snapshot {
    fn borrower(&self, borrower_id: &str) -> Option<Borrower> {
        self.borrower.clone().filter(|b| b.id == borrower_id)
    }

    fn count_active_loans(&self, borrower_id: &str) -> u32 {
        match &self.borrower {
            Some(b) if b.id == borrower_id => self.active_loans,
            _ => 0,
        }
    }
}

impl LoanLedger for Snapshot {
    fn loan(&self, loan_id: &str) -> Option<Loan> {
        self.loan.clone().filter(|loan| loan.id == loan_id)
    }

    fn fine_for_loan(&self, loan_id: &str) -> Option<Fine> {
        self.fine.clone().filter(|fine| fine.loan_id == loan_id)
    }
}

async fn borrower_snapshot(
    conn: &mut SqliteConnection,
    borrower_id: &str,
) -> Result<Snapshot, DbError> {
    let borrower = BorrowerRepository::find_in(conn, borrower_id).await?;
    let active_loans = match &borrower {
        Some(b) => BorrowerRepository::count_active_loans_in(conn, &b.id).await?,
        None => 0,
    };
    Ok(Snapshot {
        borrower,
        active_loans,
        ..Snapshot::default()
    })
}

async fn loan_snapshot(conn: &mut SqliteConnection, loan_id: &str) -> Result<Snapshot, DbError> {
    let loan = LoanRepository::find_in(conn, loan_id).await?;
    let (fine, item) = match &loan {
        Some(loan) => (
            FineRepository::for_loan_in(conn, &loan.id).await?,
            ItemRepository::find_in(conn, &loan.item_id).await?,
        ),
        None => (None, None),
    };
    Ok(Snapshot {
        loan,
        fine,
        item,
        ..Snapshot::default()
    })
}

// =============================================================================
// Service
// =============================================================================

/// Applies lending decisions to the database atomically.
#[derive(Clone)]
pub struct LendingService {
    pool: SqlitePool,
    engine: LoanEngine<Arc<dyn Clock>>,
}

impl LendingService {
    pub fn new(pool: SqlitePool, policies: PolicyTable, clock: Arc<dyn Clock>) -> Self {
        LendingService {
            pool,
            engine: LoanEngine::new(policies, clock),
        }
    }

    pub fn engine(&self) -> &LoanEngine<Arc<dyn Clock>> {
        &self.engine
    }

    /// Opens a transaction that holds the write lock from its first statement.
    ///
    /// A deferred transaction that reads first cannot wait for the lock when
    /// it later writes; SQLite fails it with `SQLITE_BUSY` straight away.
    /// `BEGIN IMMEDIATE` queues behind other writers for up to `busy_timeout`.
    async fn begin_write(&self) -> ServiceResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    // -------------------------------------------------------------------------
    // Decisions
    // -------------------------------------------------------------------------

    /// Lends one copy of `item_id` to `borrower_id`.
    #[instrument(skip(self))]
    pub async fn borrow(&self, borrower_id: &str, item_id: &str) -> ServiceResult<BorrowOutcome> {
        let mut tx = self.begin_write().await?;

        let mut snapshot = borrower_snapshot(&mut tx, borrower_id).await?;
        snapshot.item = ItemRepository::find_in(&mut tx, item_id).await?;

        let outcome = self
            .engine
            .borrow(&snapshot, &snapshot, borrower_id, item_id)
            .map_err(|e| rejected("borrow", e))?;

        LoanRepository::insert_in(&mut tx, &outcome.loan).await?;
        apply_change(&mut tx, &outcome.change).await?;

        tx.commit().await?;

        info!(
            loan_id = %outcome.loan.id,
            borrower_id,
            item_id,
            due_at = %outcome.loan.due_at,
            "Loan created"
        );
        Ok(outcome)
    }

    /// Takes a loan back, assessing a fine when it comes back late.
    #[instrument(skip(self))]
    pub async fn return_item(&self, loan_id: &str) -> ServiceResult<ReturnOutcome> {
        let mut tx = self.begin_write().await?;

        let snapshot = loan_snapshot(&mut tx, loan_id).await?;
        let outcome = self
            .engine
            .return_item(&snapshot, &snapshot, loan_id)
            .map_err(|e| rejected("return", e))?;

        let returned_at = outcome
            .loan
            .returned_at
            .ok_or_else(|| LoanError::invariant(format!("loan {loan_id} has no return date")))
            .map_err(|e| rejected("return", e))?;
        if !LoanRepository::mark_returned_in(&mut tx, &outcome.loan.id, returned_at).await? {
            return Err(rejected(
                "return",
                LoanError::AlreadyReturned(outcome.loan.id.clone()),
            ));
        }
        apply_change(&mut tx, &outcome.change).await?;
        if let Some(FineAssessment::New(fine)) = &outcome.fine {
            FineRepository::insert_in(&mut tx, fine).await?;
        }

        tx.commit().await?;

        info!(
            loan_id,
            fine = ?outcome.fine.as_ref().map(|f| f.fine().amount.to_string()),
            "Loan returned"
        );
        Ok(outcome)
    }

    /// Assesses (or returns the recorded) fine for a loan.
    #[instrument(skip(self))]
    pub async fn assess_fine(&self, loan_id: &str) -> ServiceResult<Option<FineAssessment>> {
        let mut tx = self.begin_write().await?;

        let snapshot = loan_snapshot(&mut tx, loan_id).await?;
        let assessment = self
            .engine
            .assess_fine(&snapshot, loan_id)
            .map_err(|e| rejected("assess_fine", e))?;

        if let Some(FineAssessment::New(fine)) = &assessment {
            FineRepository::insert_in(&mut tx, fine).await?;
            info!(fine_id = %fine.id, loan_id, amount = %fine.amount, "Fine assessed");
        }

        tx.commit().await?;
        Ok(assessment)
    }

    /// Marks a pending fine as paid.
    #[instrument(skip(self))]
    pub async fn pay_fine(&self, fine_id: &str) -> ServiceResult<Fine> {
        validate_entity_id("fine_id", fine_id).map_err(|e| rejected("pay_fine", e.into()))?;
        let now = self.engine.now();
        self.settle(fine_id, "pay_fine", |fine| fine.mark_paid(now))
            .await
    }

    /// Waives a pending fine, recording why.
    #[instrument(skip(self))]
    pub async fn waive_fine(&self, fine_id: &str, reason: &str) -> ServiceResult<Fine> {
        validate_entity_id("fine_id", fine_id).map_err(|e| rejected("waive_fine", e.into()))?;
        validate_reason(reason).map_err(|e| rejected("waive_fine", e.into()))?;
        let reason = reason.trim().to_string();
        self.settle(fine_id, "waive_fine", move |fine| fine.waive(reason))
            .await
    }

    async fn settle<F>(&self, fine_id: &str, operation: &'static str, apply: F) -> ServiceResult<Fine>
    where
        F: FnOnce(&mut Fine) -> Result<(), LoanError>,
    {
        let mut tx = self.begin_write().await?;

        let mut fine = FineRepository::find_in(&mut tx, fine_id)
            .await?
            .ok_or_else(|| rejected(operation, LoanError::FineNotFound(fine_id.to_string())))?;
        apply(&mut fine).map_err(|e| rejected(operation, e))?;

        if !FineRepository::settle_in(&mut tx, &fine).await? {
            return Err(rejected(
                operation,
                LoanError::FineNotPending {
                    fine_id: fine.id.clone(),
                    status: "settled".to_string(),
                },
            ));
        }

        tx.commit().await?;

        info!(fine_id, status = %fine.status, "Fine settled");
        Ok(fine)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// A loan with its status projected for now.
    pub async fn loan(&self, loan_id: &str) -> ServiceResult<Loan> {
        let loan = LoanRepository::new(self.pool.clone())
            .get_by_id(loan_id)
            .await?
            .ok_or_else(|| LoanError::LoanNotFound(loan_id.to_string()))?;
        Ok(self.engine.project(loan))
    }

    /// A borrower's loans, most recent first.
    pub async fn loans_for_borrower(&self, borrower_id: &str) -> ServiceResult<Vec<Loan>> {
        if BorrowerRepository::new(self.pool.clone())
            .get_by_id(borrower_id)
            .await?
            .is_none()
        {
            return Err(LoanError::BorrowerNotFound(borrower_id.to_string()).into());
        }

        let loans = LoanRepository::new(self.pool.clone())
            .for_borrower(borrower_id)
            .await?;
        Ok(loans.into_iter().map(|l| self.engine.project(l)).collect())
    }

    /// Every unreturned loan, overdue ones included.
    pub async fn active_loans(&self) -> ServiceResult<Vec<Loan>> {
        let loans = LoanRepository::new(self.pool.clone()).unreturned().await?;
        Ok(loans.into_iter().map(|l| self.engine.project(l)).collect())
    }

    /// Unreturned loans past their due date, earliest due first.
    pub async fn list_overdue(&self) -> ServiceResult<Vec<Loan>> {
        let loans = LoanRepository::new(self.pool.clone()).unreturned().await?;
        let overdue = self.engine.list_overdue(loans);
        debug!(count = overdue.len(), "Listed overdue loans");
        Ok(overdue)
    }

    /// The borrower's standing with a freshly counted active-loan total.
    pub async fn eligibility(&self, borrower_id: &str) -> ServiceResult<Eligibility> {
        let mut conn = self.pool.acquire().await?;
        let snapshot = borrower_snapshot(&mut conn, borrower_id).await?;
        self.engine
            .eligibility(&snapshot, borrower_id)
            .map_err(|e| rejected("eligibility", e))
    }

    /// What a loan would be fined right now, without recording anything.
    pub async fn quote_fine(&self, loan_id: &str) -> ServiceResult<FineQuote> {
        let loan = self.loan(loan_id).await?;
        self.engine
            .quote_fine(&loan)
            .map_err(|e| rejected("quote_fine", e))
    }

    pub async fn fine_for_loan(&self, loan_id: &str) -> ServiceResult<Option<Fine>> {
        Ok(FineRepository::new(self.pool.clone())
            .for_loan(loan_id)
            .await?)
    }

    pub async fn fine_summary(&self) -> ServiceResult<FineSummary> {
        Ok(FineRepository::new(self.pool.clone()).summary().await?)
    }
}

/// Applies a catalog instruction with its guard.
async fn apply_change(conn: &mut SqliteConnection, change: &AvailabilityChange) -> ServiceResult<()> {
    match change {
        AvailabilityChange::Decrement { item_id } => {
            if !ItemRepository::decrement_in(conn, item_id).await? {
                return Err(rejected(
                    "borrow",
                    LoanError::Unavailable {
                        item_id: item_id.clone(),
                    },
                ));
            }
        }
        AvailabilityChange::Increment { item_id } => {
            if !ItemRepository::increment_in(conn, item_id).await? {
                return Err(rejected(
                    "return",
                    LoanError::invariant(format!(
                        "item {item_id} is already at its total copy count"
                    )),
                ));
            }
        }
    }
    debug!(item_id = change.item_id(), delta = change.delta(), "Availability updated");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
