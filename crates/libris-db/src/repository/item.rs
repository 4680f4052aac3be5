//! # Item Repository
//!
//! Catalog items and their copy counts.
//!
//! ## Guarded Availability Updates
//! ```text
//! decrement:  UPDATE … SET available_copies = available_copies - 1
//!             WHERE id = ? AND available_copies > 0
//! increment:  UPDATE … SET available_copies = available_copies + 1
//!             WHERE id = ? AND available_copies < total_copies
//! ```
//! Both report whether a row changed; the service turns `false` into the
//! matching lending error instead of trusting the earlier read.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use libris_core::Item;

/// Repository for catalog items.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_in(&mut conn, id).await
    }

    /// Lists the whole catalog, ordered by title.
    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, title, available_copies, total_copies
            FROM items
            ORDER BY title, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a catalog item.
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, copies = item.total_copies, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (id, title, available_copies, total_copies)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&item.id)
        .bind(&item.title)
        .bind(item.available_copies)
        .bind(item.total_copies)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, item.id.clone()),
            other => other,
        })?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Connection-level operations (used inside transactions)
    // -------------------------------------------------------------------------

    pub async fn find_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, title, available_copies, total_copies
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(item)
    }

    /// Takes one copy off the shelf. Returns `false` if none was available.
    pub async fn decrement_in(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET available_copies = available_copies - 1
            WHERE id = ?1 AND available_copies > 0
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Puts one copy back. Returns `false` if the shelf was already full.
    pub async fn increment_in(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET available_copies = available_copies + 1
            WHERE id = ?1 AND available_copies < total_copies
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn item(id: &str, copies: u32) -> Item {
        Item {
            id: id.to_string(),
            title: "The Pragmatic Programmer".to_string(),
            available_copies: copies,
            total_copies: copies,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.items().insert(&item("BK-1", 2)).await.unwrap();

        let found = db.items().get_by_id("BK-1").await.unwrap().unwrap();
        assert_eq!(found, item("BK-1", 2));
        assert!(db.items().get_by_id("BK-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.items().insert(&item("BK-1", 1)).await.unwrap();
        let err = db.items().insert(&item("BK-1", 1)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "BK-1"));
    }

    #[tokio::test]
    async fn test_guarded_updates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.items().insert(&item("BK-1", 1)).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        // Full shelf: nothing to put back
        assert!(!ItemRepository::increment_in(&mut conn, "BK-1").await.unwrap());

        assert!(ItemRepository::decrement_in(&mut conn, "BK-1").await.unwrap());
        assert!(!ItemRepository::decrement_in(&mut conn, "BK-1").await.unwrap());

        assert!(ItemRepository::increment_in(&mut conn, "BK-1").await.unwrap());
        let found = ItemRepository::find_in(&mut conn, "BK-1").await.unwrap().unwrap();
        assert_eq!(found.available_copies, 1);
    }
}
