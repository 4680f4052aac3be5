//! # Fine Repository
//!
//! Fines and their settlement. `fines.loan_id` is UNIQUE, so a second
//! insert for the same loan fails instead of creating a duplicate.

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use libris_core::{Fine, FineStatus, Money};

const FINE_COLUMNS: &str = "id, loan_id, amount_cents, status, assessed_at, paid_at, remarks";

/// Count and sum of fines in one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FineTally {
    pub count: u32,
    pub total: Money,
}

/// Fines grouped by settlement status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FineSummary {
    pub pending: FineTally,
    pub paid: FineTally,
    pub waived: FineTally,
}

/// Repository for fine records.
#[derive(Debug, Clone)]
pub struct FineRepository {
    pool: SqlitePool,
}

impl FineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FineRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Fine>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_in(&mut conn, id).await
    }

    pub async fn for_loan(&self, loan_id: &str) -> DbResult<Option<Fine>> {
        let mut conn = self.pool.acquire().await?;
        Self::for_loan_in(&mut conn, loan_id).await
    }

    /// Lists fines, optionally filtered by status, newest first.
    pub async fn list(&self, status: Option<FineStatus>) -> DbResult<Vec<Fine>> {
        let fines = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {FINE_COLUMNS} FROM fines WHERE status = ?1 \
                     ORDER BY assessed_at DESC, id"
                );
                sqlx::query_as::<_, Fine>(&sql)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql =
                    format!("SELECT {FINE_COLUMNS} FROM fines ORDER BY assessed_at DESC, id");
                sqlx::query_as::<_, Fine>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(fines)
    }

    /// Counts and sums fines per status.
    pub async fn summary(&self) -> DbResult<FineSummary> {
        let rows: Vec<(FineStatus, i64, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*), COALESCE(SUM(amount_cents), 0)
            FROM fines
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut summary = FineSummary::default();
        for (status, count, total_cents) in rows {
            let tally = FineTally {
                count: u32::try_from(count)
                    .map_err(|_| DbError::Internal(format!("fine count out of range: {count}")))?,
                total: Money::from_cents(total_cents),
            };
            match status {
                FineStatus::Pending => summary.pending = tally,
                FineStatus::Paid => summary.paid = tally,
                FineStatus::Waived => summary.waived = tally,
            }
        }

        Ok(summary)
    }

    // -------------------------------------------------------------------------
    // Connection-level operations (used inside transactions)
    // -------------------------------------------------------------------------

    pub async fn find_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Fine>> {
        let sql = format!("SELECT {FINE_COLUMNS} FROM fines WHERE id = ?1");
        let fine = sqlx::query_as::<_, Fine>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(fine)
    }

    pub async fn for_loan_in(conn: &mut SqliteConnection, loan_id: &str) -> DbResult<Option<Fine>> {
        let sql = format!("SELECT {FINE_COLUMNS} FROM fines WHERE loan_id = ?1");
        let fine = sqlx::query_as::<_, Fine>(&sql)
            .bind(loan_id)
            .fetch_optional(conn)
            .await?;

        Ok(fine)
    }

    pub async fn insert_in(conn: &mut SqliteConnection, fine: &Fine) -> DbResult<()> {
        debug!(id = %fine.id, loan_id = %fine.loan_id, amount = %fine.amount, "Inserting fine");

        sqlx::query(
            r#"
            INSERT INTO fines (
                id, loan_id, amount_cents, status,
                assessed_at, paid_at, remarks
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&fine.id)
        .bind(&fine.loan_id)
        .bind(fine.amount)
        .bind(fine.status)
        .bind(fine.assessed_at)
        .bind(fine.paid_at)
        .bind(&fine.remarks)
        .execute(conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, fine.loan_id.clone())
            }
            other => other,
        })?;

        Ok(())
    }

    /// Writes a settled fine back. Only a still-pending row is updated;
    /// returns `false` if someone settled it first.
    pub async fn settle_in(conn: &mut SqliteConnection, fine: &Fine) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE fines
            SET status = ?2, paid_at = ?3, remarks = ?4
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(&fine.id)
        .bind(fine.status)
        .bind(fine.paid_at)
        .bind(&fine.remarks)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::LoanRepository;
    use chrono::{Duration, TimeZone, Utc};
    use libris_core::{Borrower, BorrowerClass, Item, Loan, LoanStatus};

    async fn setup_with_loans(ids: &[&str]) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.borrowers()
            .insert(&Borrower {
                id: "STU-1".to_string(),
                name: "Juan".to_string(),
                class: BorrowerClass::Standard,
                is_active: true,
            })
            .await
            .unwrap();
        db.items()
            .insert(&Item {
                id: "BK-1".to_string(),
                title: "Refactoring".to_string(),
                available_copies: 5,
                total_copies: 5,
            })
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let borrowed_at = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        for id in ids {
            let loan = Loan {
                id: id.to_string(),
                borrower_id: "STU-1".to_string(),
                item_id: "BK-1".to_string(),
                borrower_class: BorrowerClass::Standard,
                borrowed_at,
                due_at: borrowed_at + Duration::days(14),
                returned_at: None,
                status: LoanStatus::Active,
            };
            LoanRepository::insert_in(&mut conn, &loan).await.unwrap();
        }
        db
    }

    fn fine(id: &str, loan_id: &str, cents: i64) -> Fine {
        Fine {
            id: id.to_string(),
            loan_id: loan_id.to_string(),
            amount: Money::from_cents(cents),
            status: FineStatus::Pending,
            assessed_at: Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap(),
            paid_at: None,
            remarks: Some("Overdue by 17 days".to_string()),
        }
    }

    #[tokio::test]
    async fn test_one_fine_per_loan() {
        let db = setup_with_loans(&["L-1"]).await;
        let mut conn = db.pool().acquire().await.unwrap();

        FineRepository::insert_in(&mut conn, &fine("F-1", "L-1", 5750))
            .await
            .unwrap();
        let err = FineRepository::insert_in(&mut conn, &fine("F-2", "L-1", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        drop(conn);

        let found = db.fines().for_loan("L-1").await.unwrap().unwrap();
        assert_eq!(found.id, "F-1");
        assert_eq!(found.amount.cents(), 5750);
    }

    #[tokio::test]
    async fn test_settle_only_pending() {
        let db = setup_with_loans(&["L-1"]).await;
        let mut conn = db.pool().acquire().await.unwrap();
        let mut f = fine("F-1", "L-1", 5750);
        FineRepository::insert_in(&mut conn, &f).await.unwrap();

        f.mark_paid(Utc.with_ymd_and_hms(2026, 2, 2, 9, 0, 0).unwrap())
            .unwrap();
        assert!(FineRepository::settle_in(&mut conn, &f).await.unwrap());
        assert!(!FineRepository::settle_in(&mut conn, &f).await.unwrap());

        let stored = FineRepository::find_in(&mut conn, "F-1").await.unwrap().unwrap();
        assert_eq!(stored.status, FineStatus::Paid);
        assert!(stored.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_summary_groups_by_status() {
        let db = setup_with_loans(&["L-1", "L-2", "L-3"]).await;
        let mut conn = db.pool().acquire().await.unwrap();
        FineRepository::insert_in(&mut conn, &fine("F-1", "L-1", 1000))
            .await
            .unwrap();
        FineRepository::insert_in(&mut conn, &fine("F-2", "L-2", 2500))
            .await
            .unwrap();
        let mut waived = fine("F-3", "L-3", 700);
        FineRepository::insert_in(&mut conn, &waived).await.unwrap();
        waived.waive("Returned in the book drop on the due date").unwrap();
        FineRepository::settle_in(&mut conn, &waived).await.unwrap();
        drop(conn);

        let summary = db.fines().summary().await.unwrap();
        assert_eq!(summary.pending.count, 2);
        assert_eq!(summary.pending.total.cents(), 3500);
        assert_eq!(summary.waived.count, 1);
        assert_eq!(summary.paid, FineTally::default());

        assert_eq!(db.fines().list(Some(FineStatus::Waived)).await.unwrap().len(), 1);
        assert_eq!(db.fines().list(None).await.unwrap().len(), 3);
    }
}
