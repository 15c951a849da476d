//! # Item Repository
//!
//! Database operations for catalog items.
//!
//! ## Key Operations
//! - Lookups by id / code and name fragment
//! - Insert and field updates
//! - Soft delete (retire)
//! - Low-stock listing
//!
//! ## Read Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items i                                                                │
//! │    LEFT JOIN categories c ON c.id = i.category_id  → category_name     │
//! │    LEFT JOIN suppliers  s ON s.id = i.supplier_id  → supplier_name     │
//! │                                                                         │
//! │  Every SELECT goes through ITEM_SELECT so all reads return the same    │
//! │  shape, whether they run on the pool or inside a StockTx.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use ferreteria_core::validation::fold_name;
use ferreteria_core::{Item, ItemUpdate, NewItem};

/// Shared projection for every item read.
pub(crate) const ITEM_SELECT: &str = r#"
    SELECT
        i.id,
        i.code,
        i.name,
        i.description,
        i.category_id,
        c.name AS category_name,
        i.supplier_id,
        s.name AS supplier_name,
        i.purchase_price_cents,
        i.sale_price_cents,
        i.current_stock,
        i.min_stock,
        i.active,
        i.created_at,
        i.updated_at
    FROM items i
    LEFT JOIN categories c ON c.id = i.category_id
    LEFT JOIN suppliers s ON s.id = i.supplier_id
"#;

// =============================================================================
// Executor-generic statements (pool or transaction)
// =============================================================================

pub(crate) async fn fetch_by_id<'e, E>(exec: E, id: i64) -> DbResult<Option<Item>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{ITEM_SELECT} WHERE i.id = ?1");
    let item = sqlx::query_as::<_, Item>(&sql)
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(item)
}

pub(crate) async fn update_fields<'e, E>(exec: E, update: &ItemUpdate) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE items SET
            name = ?1,
            name_folded = ?2,
            description = ?3,
            category_id = ?4,
            supplier_id = ?5,
            purchase_price_cents = ?6,
            sale_price_cents = ?7,
            min_stock = ?8,
            active = ?9,
            updated_at = ?10
        WHERE id = ?11
        "#,
    )
    .bind(&update.name)
    .bind(fold_name(&update.name))
    .bind(&update.description)
    .bind(update.category_id)
    .bind(update.supplier_id)
    .bind(update.purchase_price.cents())
    .bind(update.sale_price.cents())
    .bind(update.min_stock)
    .bind(update.active)
    .bind(Utc::now())
    .bind(update.id)
    .execute(exec)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn write_stock<'e, E>(exec: E, id: i64, new_stock: i64) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE items SET current_stock = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(new_stock)
        .bind(Utc::now())
        .bind(id)
        .execute(exec)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Escapes LIKE wildcards so a fragment matches literally.
fn escape_like(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + 2);
    for ch in fragment.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for item database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
///
/// let hammer = repo.find_by_code("MART001").await?;
/// let matches = repo.search_by_name("martillo").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts a validated item and returns it as stored.
    ///
    /// Insert and read-back run in one transaction, so the returned row
    /// carries the assigned id, timestamps and joined names.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - `code` already taken
    pub async fn insert(&self, item: &NewItem) -> DbResult<Item> {
        debug!(code = %item.code, "Inserting item");

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO items (
                code, name, name_folded, description, category_id, supplier_id,
                purchase_price_cents, sale_price_cents,
                current_stock, min_stock, active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&item.code)
        .bind(&item.name)
        .bind(fold_name(&item.name))
        .bind(&item.description)
        .bind(item.category_id)
        .bind(item.supplier_id)
        .bind(item.purchase_price.cents())
        .bind(item.sale_price.cents())
        .bind(item.current_stock)
        .bind(item.min_stock)
        .bind(item.active)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, item.code.clone()),
            other => other,
        })?;

        let id = result.last_insert_rowid();
        let stored = fetch_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))?;

        tx.commit().await?;

        debug!(id, code = %stored.code, "Item inserted");
        Ok(stored)
    }

    /// Gets an item by id, active or retired.
    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<Item>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Gets an item by its exact (already normalized) code, active or retired.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Item>> {
        let sql = format!("{ITEM_SELECT} WHERE i.code = ?1");
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Active items whose name contains `fragment`, case-insensitive.
    ///
    /// Matches against `name_folded`, so non-ASCII letters (ñ, á) fold too.
    /// Ordered by name ascending.
    pub async fn search_by_name(&self, fragment: &str) -> DbResult<Vec<Item>> {
        let pattern = format!("%{}%", escape_like(&fold_name(fragment)));
        let sql = format!(
            r#"{ITEM_SELECT}
            WHERE i.active = 1 AND i.name_folded LIKE ?1 ESCAPE '\'
            ORDER BY i.name"#
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        debug!(fragment, count = items.len(), "Name search returned items");
        Ok(items)
    }

    /// All active items ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Item>> {
        let sql = format!("{ITEM_SELECT} WHERE i.active = 1 ORDER BY i.name");
        let items = sqlx::query_as::<_, Item>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Active items at or below their minimum, lowest stock first.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Item>> {
        let sql = format!(
            "{ITEM_SELECT} WHERE i.active = 1 AND i.current_stock <= i.min_stock \
             ORDER BY i.current_stock, i.name"
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Updates every mutable field except stock.
    ///
    /// Stock changes go through [`crate::StockTx`] so they are audited.
    ///
    /// ## Returns
    /// * `Ok(false)` - no row with that id
    pub async fn update(&self, update: &ItemUpdate) -> DbResult<bool> {
        update_fields(&self.pool, update).await
    }

    /// Sets stock outside a transaction. No movement is recorded.
    ///
    /// Only for seeding; service paths use [`crate::StockTx::set_item_stock`].
    pub async fn set_stock(&self, id: i64, new_stock: i64) -> DbResult<bool> {
        write_stock(&self.pool, id, new_stock).await
    }

    /// Retires an item. The row and its movements stay.
    ///
    /// ## Returns
    /// * `Ok(false)` - no row with that id
    pub async fn soft_delete(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("UPDATE items SET active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// True if another item already uses `code`.
    ///
    /// ## Arguments
    /// * `exclude_id` - ignore this item (the one being updated)
    pub async fn exists_by_code(&self, code: &str, exclude_id: Option<i64>) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM items WHERE code = ?1 AND (?2 IS NULL OR id != ?2))",
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn exists_by_id(&self, id: i64) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Rewrites `name_folded` for rows whose stored fold is stale.
    ///
    /// Returns the number of rows rewritten.
    pub async fn refold_names(&self) -> DbResult<u64> {
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, name, name_folded FROM items")
                .fetch_all(&self.pool)
                .await?;

        let mut rewritten = 0;
        for (id, name, folded) in rows {
            let expected = fold_name(&name);
            if expected != folded {
                sqlx::query("UPDATE items SET name_folded = ?1 WHERE id = ?2")
                    .bind(expected)
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }

    /// Number of item rows, active or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
