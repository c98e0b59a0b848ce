//! SQLite database operations for tiers and assignments.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use super::models::{AssignmentWithTier, ClearOutcome, CreateTier, TierRow, UpsertOutcome};

/// Render a timestamp the way it is stored: fixed-width RFC 3339, so text
/// ordering matches time ordering.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Tier database. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct TierDb {
    pool: SqlitePool,
}

impl TierDb {
    /// Open or create the database at the given path.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to open SQLite database")?;

        let db = Self { pool };
        db.migrate().await.context("Failed to migrate database")?;

        Ok(db)
    }

    /// Fresh private in-memory database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // A single connection that never idles out, or the database vanishes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Run database migrations.
    async fn migrate(&self) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tiers (
                id TEXT PRIMARY KEY,
                shop TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                min_spent_units INTEGER NOT NULL DEFAULT 0,
                min_orders INTEGER NOT NULL DEFAULT 0,
                discount_percentage INTEGER NOT NULL DEFAULT 0,
                priority INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS assignments (
                id TEXT PRIMARY KEY,
                shop TEXT NOT NULL,
                customer_id TEXT NOT NULL,
                tier_id TEXT NOT NULL,
                assigned_at TEXT NOT NULL,
                UNIQUE(shop, customer_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tiers_shop ON tiers(shop, active)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_assignments_tier ON assignments(tier_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== Tier Operations ====================

    /// Insert a tier, returning its id.
    pub async fn insert_tier(&self, input: &CreateTier) -> sqlx::Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO tiers (
                id, shop, name, description, min_spent_units, min_orders,
                discount_percentage, priority, active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.shop)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.min_spent.units())
        .bind(i64::from(input.min_orders))
        .bind(i64::from(input.discount_percentage))
        .bind(i64::from(input.priority))
        .bind(input.active)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// All tiers of a shop, active or not, in creation order.
    pub async fn list_tiers(&self, shop: &str) -> sqlx::Result<Vec<TierRow>> {
        sqlx::query_as::<_, TierRow>(
            "SELECT * FROM tiers WHERE shop = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(shop)
        .fetch_all(&self.pool)
        .await
    }

    /// Active tiers of a shop in creation order (the tie-break order).
    pub async fn active_tiers(&self, shop: &str) -> sqlx::Result<Vec<TierRow>> {
        sqlx::query_as::<_, TierRow>(
            "SELECT * FROM tiers WHERE shop = ? AND active = 1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(shop)
        .fetch_all(&self.pool)
        .await
    }

    /// Enable or disable a tier. Returns false if no such tier.
    pub async fn set_tier_active(&self, shop: &str, id: &str, active: bool) -> sqlx::Result<bool> {
        let result = sqlx::query("UPDATE tiers SET active = ? WHERE shop = ? AND id = ?")
            .bind(active)
            .bind(shop)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_active_tiers(&self, shop: &str) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tiers WHERE shop = ? AND active = 1")
            .bind(shop)
            .fetch_one(&self.pool)
            .await
    }

    // ==================== Assignment Operations ====================

    /// Conditional upsert on the (shop, customer) uniqueness constraint.
    ///
    /// Inserts when absent, replaces tier and timestamp when the tier differs,
    /// and writes nothing when the tier is already current.
    pub async fn upsert_assignment(
        &self,
        shop: &str,
        customer_id: &str,
        tier_id: &str,
    ) -> sqlx::Result<UpsertOutcome> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp(Utc::now());

        let written: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO assignments (id, shop, customer_id, tier_id, assigned_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(shop, customer_id) DO UPDATE SET
                tier_id = excluded.tier_id,
                assigned_at = excluded.assigned_at
            WHERE assignments.tier_id <> excluded.tier_id
            RETURNING id
            "#,
        )
        .bind(&id)
        .bind(shop)
        .bind(customer_id)
        .bind(tier_id)
        .bind(&now)
        .fetch_optional(&self.pool)
        .await?;

        // RETURNING yields the new id on insert, the existing row's id on
        // update, and nothing when the WHERE clause suppressed the update.
        Ok(match written {
            Some(returned) if returned == id => UpsertOutcome::Inserted,
            Some(_) => UpsertOutcome::Replaced,
            None => UpsertOutcome::Unchanged,
        })
    }

    /// Delete the assignment for (shop, customer) if present.
    pub async fn clear_assignment(&self, shop: &str, customer_id: &str) -> sqlx::Result<ClearOutcome> {
        let result = sqlx::query("DELETE FROM assignments WHERE shop = ? AND customer_id = ?")
            .bind(shop)
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        Ok(if result.rows_affected() > 0 {
            ClearOutcome::Removed
        } else {
            ClearOutcome::Absent
        })
    }

    /// Every assignment row for (shop, customer), joined with its tier name.
    ///
    /// Returns all matches so callers can detect duplicate rows.
    pub async fn find_assignments(
        &self,
        shop: &str,
        customer_id: &str,
    ) -> sqlx::Result<Vec<AssignmentWithTier>> {
        sqlx::query_as::<_, AssignmentWithTier>(
            r#"
            SELECT
                a.id, a.shop, a.customer_id, a.tier_id, a.assigned_at,
                t.name AS tier_name
            FROM assignments a
            LEFT JOIN tiers t ON t.id = a.tier_id
            WHERE a.shop = ? AND a.customer_id = ?
            "#,
        )
        .bind(shop)
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
    }

    /// All assignments of a shop, oldest first.
    pub async fn list_assignments(&self, shop: &str) -> sqlx::Result<Vec<AssignmentWithTier>> {
        sqlx::query_as::<_, AssignmentWithTier>(
            r#"
            SELECT
                a.id, a.shop, a.customer_id, a.tier_id, a.assigned_at,
                t.name AS tier_name
            FROM assignments a
            LEFT JOIN tiers t ON t.id = a.tier_id
            WHERE a.shop = ?
            ORDER BY a.assigned_at ASC, a.rowid ASC
            "#,
        )
        .bind(shop)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_assignments(&self, shop: &str) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE shop = ?")
            .bind(shop)
            .fetch_one(&self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Money;
    use tempfile::tempdir;

    fn tier(shop: &str, name: &str, priority: u32) -> CreateTier {
        CreateTier {
            shop: shop.to_string(),
            name: name.to_string(),
            description: None,
            min_spent: Money::whole(100),
            min_orders: 2,
            discount_percentage: 10,
            priority,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_open_creates_file_and_reopens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("tiers.sqlite");

        {
            let db = TierDb::open(&path).await.unwrap();
            db.insert_tier(&tier("a.myshopify.com", "Gold", 10)).await.unwrap();
        }

        assert!(path.exists());
        let db = TierDb::open(&path).await.unwrap();
        assert_eq!(db.list_tiers("a.myshopify.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_active_tiers_filters_and_scopes_by_shop() {
        let db = TierDb::in_memory().await.unwrap();
        let gold = db.insert_tier(&tier("a", "Gold", 10)).await.unwrap();
        let mut silver = tier("a", "Silver", 5);
        silver.active = false;
        db.insert_tier(&silver).await.unwrap();
        db.insert_tier(&tier("b", "Other", 1)).await.unwrap();

        let active = db.active_tiers("a").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, gold);
        assert_eq!(active[0].min_spent_units, Money::whole(100).units());
        assert_eq!(db.count_active_tiers("a").await.unwrap(), 1);
        assert_eq!(db.list_tiers("a").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_set_tier_active() {
        let db = TierDb::in_memory().await.unwrap();
        let id = db.insert_tier(&tier("a", "Gold", 10)).await.unwrap();

        assert!(db.set_tier_active("a", &id, false).await.unwrap());
        assert!(db.active_tiers("a").await.unwrap().is_empty());
        assert!(!db.set_tier_active("b", &id, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_outcomes() {
        let db = TierDb::in_memory().await.unwrap();

        let first = db.upsert_assignment("a", "c1", "t1").await.unwrap();
        assert_eq!(first, UpsertOutcome::Inserted);

        let before = db.find_assignments("a", "c1").await.unwrap();

        let same = db.upsert_assignment("a", "c1", "t1").await.unwrap();
        assert_eq!(same, UpsertOutcome::Unchanged);
        let after = db.find_assignments("a", "c1").await.unwrap();
        assert_eq!(before[0].assigned_at, after[0].assigned_at);
        assert_eq!(before[0].id, after[0].id);

        let changed = db.upsert_assignment("a", "c1", "t2").await.unwrap();
        assert_eq!(changed, UpsertOutcome::Replaced);
        let rows = db.find_assignments("a", "c1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tier_id, "t2");
        assert_eq!(rows[0].id, before[0].id);
        assert!(rows[0].assigned_at >= before[0].assigned_at);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let db = TierDb::in_memory().await.unwrap();
        db.upsert_assignment("a", "c1", "t1").await.unwrap();

        assert_eq!(db.clear_assignment("a", "c1").await.unwrap(), ClearOutcome::Removed);
        assert_eq!(db.clear_assignment("a", "c1").await.unwrap(), ClearOutcome::Absent);
        assert!(db.find_assignments("a", "c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_customer_in_two_shops() {
        let db = TierDb::in_memory().await.unwrap();
        db.upsert_assignment("a", "c1", "t1").await.unwrap();
        db.upsert_assignment("b", "c1", "t9").await.unwrap();

        assert_eq!(db.count_assignments("a").await.unwrap(), 1);
        assert_eq!(db.count_assignments("b").await.unwrap(), 1);
        assert_eq!(db.find_assignments("b", "c1").await.unwrap()[0].tier_id, "t9");
    }

    #[tokio::test]
    async fn test_find_joins_tier_name() {
        let db = TierDb::in_memory().await.unwrap();
        let gold = db.insert_tier(&tier("a", "Gold", 10)).await.unwrap();
        db.upsert_assignment("a", "c1", &gold).await.unwrap();
        db.upsert_assignment("a", "c2", "deleted-tier").await.unwrap();

        let listed = db.list_assignments("a").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].tier_name.as_deref(), Some("Gold"));
        assert_eq!(listed[1].tier_name, None);
    }
}
