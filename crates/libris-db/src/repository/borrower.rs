//! # Borrower Repository
//!
//! The borrower directory: registered members and their active-loan counts.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use libris_core::Borrower;

/// Repository for borrower records.
#[derive(Debug, Clone)]
pub struct BorrowerRepository {
    pool: SqlitePool,
}

impl BorrowerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BorrowerRepository { pool }
    }

    /// Gets a borrower by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Borrower>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_in(&mut conn, id).await
    }

    /// Lists every borrower, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Borrower>> {
        let borrowers = sqlx::query_as::<_, Borrower>(
            r#"
            SELECT id, name, class, is_active
            FROM borrowers
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowers)
    }

    /// Registers a borrower. The class is fixed from here on.
    pub async fn insert(&self, borrower: &Borrower) -> DbResult<()> {
        debug!(id = %borrower.id, class = %borrower.class, "Inserting borrower");

        sqlx::query(
            r#"
            INSERT INTO borrowers (id, name, class, is_active)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&borrower.id)
        .bind(&borrower.name)
        .bind(borrower.class)
        .bind(borrower.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, borrower.id.clone())
            }
            other => other,
        })?;

        Ok(())
    }

    /// Enables or disables a borrower.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE borrowers SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Borrower", id));
        }

        Ok(())
    }

    /// Counts the borrower's unreturned loans.
    pub async fn count_active_loans(&self, borrower_id: &str) -> DbResult<u32> {
        let mut conn = self.pool.acquire().await?;
        Self::count_active_loans_in(&mut conn, borrower_id).await
    }

    // -------------------------------------------------------------------------
    // Connection-level operations (used inside transactions)
    // -------------------------------------------------------------------------

    pub async fn find_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>(
            r#"
            SELECT id, name, class, is_active
            FROM borrowers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(borrower)
    }

    /// Overdue loans count too: an item not yet back still holds a slot.
    pub async fn count_active_loans_in(
        conn: &mut SqliteConnection,
        borrower_id: &str,
    ) -> DbResult<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM loans
            WHERE borrower_id = ?1 AND returned_at IS NULL
            "#,
        )
        .bind(borrower_id)
        .fetch_one(conn)
        .await?;

        u32::try_from(count)
            .map_err(|_| DbError::Internal(format!("active loan count out of range: {count}")))
    }
}
