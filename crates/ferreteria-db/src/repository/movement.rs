//! # Movement Repository
//!
//! Append-only stock audit log. Rows are never updated or deleted; the
//! schema enforces it with triggers.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use ferreteria_core::{Movement, NewMovement};

const MOVEMENT_COLUMNS: &str =
    "id, item_id, kind, quantity, stock_before, stock_after, reason, user, timestamp";

/// Appends one movement on `exec` and returns it with its id.
pub(crate) async fn insert_movement<'e, E>(exec: E, movement: &NewMovement) -> DbResult<Movement>
where
    E: Executor<'e, Database = Sqlite>,
{
    let timestamp = movement.timestamp.unwrap_or_else(Utc::now);

    let sql = format!(
        "INSERT INTO movements (item_id, kind, quantity, stock_before, stock_after, reason, user, timestamp) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING {MOVEMENT_COLUMNS}"
    );
    let stored = sqlx::query_as::<_, Movement>(&sql)
        .bind(movement.item_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(movement.stock_before)
        .bind(movement.stock_after)
        .bind(&movement.reason)
        .bind(&movement.user)
        .bind(timestamp)
        .fetch_one(exec)
        .await?;

    debug!(
        item_id = stored.item_id,
        kind = %stored.kind,
        before = stored.stock_before,
        after = stored.stock_after,
        "Movement appended"
    );
    Ok(stored)
}

/// Repository for the movement log.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Appends a movement outside any stock transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - unknown `item_id`
    pub async fn append(&self, movement: &NewMovement) -> DbResult<Movement> {
        insert_movement(&self.pool, movement).await
    }

    /// Movements of one item, newest first.
    ///
    /// Rows sharing a timestamp come back in reverse insertion order.
    pub async fn list_by_item(&self, item_id: i64) -> DbResult<Vec<Movement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE item_id = ?1 \
             ORDER BY timestamp DESC, id DESC"
        );
        let movements = sqlx::query_as::<_, Movement>(&sql)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }

    pub async fn count_for_item(&self, item_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movements WHERE item_id = ?1")
            .bind(item_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Sum of signed deltas for an item.
    ///
    /// Equals `current_stock - initial_stock` while every stock change is audited.
    pub async fn net_change(&self, item_id: i64) -> DbResult<i64> {
        let net: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(stock_after - stock_before) FROM movements WHERE item_id = ?1",
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(net.unwrap_or(0))
    }
}
