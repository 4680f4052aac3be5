//! # Loan Repository
//!
//! Loans are stored as facts only: who, what, `borrowed_at`, `due_at` and
//! `returned_at`. Rows come back with `status` at its default; the lending
//! service projects it against its clock before anything leaves the crate.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use libris_core::Loan;

const LOAN_COLUMNS: &str =
    "id, borrower_id, item_id, borrower_class, borrowed_at, due_at, returned_at";

/// Repository for loan records.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    pool: SqlitePool,
}

impl LoanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LoanRepository { pool }
    }

    /// Gets a loan by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Loan>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_in(&mut conn, id).await
    }

    /// All loans of a borrower, most recent first.
    pub async fn for_borrower(&self, borrower_id: &str) -> DbResult<Vec<Loan>> {
        let sql = format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE borrower_id = ?1 \
             ORDER BY borrowed_at DESC, id"
        );
        let loans = sqlx::query_as::<_, Loan>(&sql)
            .bind(borrower_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(loans)
    }

    /// Every loan without a return date, earliest due first.
    ///
    /// Overdue filtering happens on the projected status, not in SQL.
    pub async fn unreturned(&self) -> DbResult<Vec<Loan>> {
        let sql = format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE returned_at IS NULL \
             ORDER BY due_at, id"
        );
        let loans = sqlx::query_as::<_, Loan>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(loans)
    }

    // -------------------------------------------------------------------------
    // Connection-level operations (used inside transactions)
    // -------------------------------------------------------------------------

    pub async fn find_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Loan>> {
        let sql = format!("SELECT {LOAN_COLUMNS} FROM loans WHERE id = ?1");
        let loan = sqlx::query_as::<_, Loan>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(loan)
    }

    pub async fn insert_in(conn: &mut SqliteConnection, loan: &Loan) -> DbResult<()> {
        debug!(
            id = %loan.id,
            borrower_id = %loan.borrower_id,
            item_id = %loan.item_id,
            due_at = %loan.due_at,
            "Inserting loan"
        );

        sqlx::query(
            r#"
            INSERT INTO loans (
                id, borrower_id, item_id, borrower_class,
                borrowed_at, due_at, returned_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&loan.id)
        .bind(&loan.borrower_id)
        .bind(&loan.item_id)
        .bind(loan.borrower_class)
        .bind(loan.borrowed_at)
        .bind(loan.due_at)
        .bind(loan.returned_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Records the return. Returns `false` if the loan was already returned.
    pub async fn mark_returned_in(
        conn: &mut SqliteConnection,
        id: &str,
        returned_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET returned_at = ?2
            WHERE id = ?1 AND returned_at IS NULL
            "#,
        )
        .bind(id)
        .bind(returned_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use libris_core::{Borrower, BorrowerClass, Item, LoanStatus};

    async fn setup() -> Database {
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
                available_copies: 3,
                total_copies: 3,
            })
            .await
            .unwrap();
        db
    }

    fn loan(id: &str, day: u32) -> Loan {
        let borrowed_at = Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap();
        Loan {
            id: id.to_string(),
            borrower_id: "STU-1".to_string(),
            item_id: "BK-1".to_string(),
            borrower_class: BorrowerClass::Standard,
            borrowed_at,
            due_at: borrowed_at + Duration::days(14),
            returned_at: None,
            status: LoanStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_insert_and_round_trip_facts() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let original = loan("L-1", 5);
        LoanRepository::insert_in(&mut conn, &original).await.unwrap();
        drop(conn);

        let found = db.loans().get_by_id("L-1").await.unwrap().unwrap();
        assert_eq!(found, original);
    }

    #[tokio::test]
    async fn test_mark_returned_once() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        LoanRepository::insert_in(&mut conn, &loan("L-1", 5)).await.unwrap();

        let at = Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap();
        assert!(LoanRepository::mark_returned_in(&mut conn, "L-1", at).await.unwrap());
        assert!(!LoanRepository::mark_returned_in(&mut conn, "L-1", at).await.unwrap());

        let found = LoanRepository::find_in(&mut conn, "L-1").await.unwrap().unwrap();
        assert_eq!(found.returned_at, Some(at));
    }

    #[tokio::test]
    async fn test_for_borrower_most_recent_first() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        for (id, day) in [("L-1", 3), ("L-2", 9), ("L-3", 6)] {
            LoanRepository::insert_in(&mut conn, &loan(id, day)).await.unwrap();
        }
        let at = Utc.with_ymd_and_hms(2026, 1, 12, 8, 0, 0).unwrap();
        LoanRepository::mark_returned_in(&mut conn, "L-3", at).await.unwrap();
        drop(conn);

        let ids: Vec<_> = db
            .loans()
            .for_borrower("STU-1")
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["L-2", "L-3", "L-1"]);

        let open: Vec<_> = db
            .loans()
            .unreturned()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(open, vec!["L-1", "L-2"]);
    }
}
