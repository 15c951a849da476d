//! # Stock Transactions
//!
//! Every stock change runs inside one `StockTx`: lock the item row, read
//! it, write the new stock, append the movement, commit. Either all of it
//! lands or none of it does.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite has no SELECT ... FOR UPDATE. The first statement of the       │
//! │  transaction is a no-op write on the item row:                          │
//! │                                                                         │
//! │     BEGIN                                                               │
//! │     UPDATE items SET id = id WHERE id = ?   ← takes the write lock      │
//! │     SELECT ... WHERE id = ?                 ← stock read under the lock │
//! │     UPDATE items SET current_stock = ?                                  │
//! │     INSERT INTO movements ...                                           │
//! │     COMMIT                                  ← lock released             │
//! │                                                                         │
//! │  A second writer blocks on busy_timeout until COMMIT, then reads the   │
//! │  committed stock. Two withdrawals can never both pass the check.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping an uncommitted `StockTx` rolls back.

use sqlx::{Sqlite, SqlitePool, Transaction};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{item, movement};
use ferreteria_core::{Item, ItemUpdate, Movement, NewMovement};

/// An open stock transaction holding the write lock once an item is locked.
pub struct StockTx {
    tx: Option<Transaction<'static, Sqlite>>,
    started: Instant,
    leak_threshold: Duration,
}

impl StockTx {
    pub(crate) async fn begin(pool: &SqlitePool, leak_threshold: Duration) -> DbResult<Self> {
        let tx = pool.begin().await?;
        Ok(StockTx {
            tx: Some(tx),
            started: Instant::now(),
            leak_threshold,
        })
    }

    fn conn(&mut self) -> DbResult<&mut Transaction<'static, Sqlite>> {
        self.tx
            .as_mut()
            .ok_or_else(|| DbError::TransactionFailed("transaction already finished".to_string()))
    }

    /// Locks the item row and returns its current state.
    ///
    /// ## Returns
    /// * `Ok(None)` - no item with that id (nothing locked)
    pub async fn lock_item(&mut self, id: i64) -> DbResult<Option<Item>> {
        let tx = self.conn()?;

        let locked = sqlx::query("UPDATE items SET id = id WHERE id = ?1")
            .bind(id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if locked == 0 {
            return Ok(None);
        }

        debug!(item_id = id, "Item row locked");
        item::fetch_by_id(&mut **tx, id).await
    }

    /// Writes `new_stock` for a locked item.
    pub async fn set_item_stock(&mut self, id: i64, new_stock: i64) -> DbResult<bool> {
        let tx = self.conn()?;
        item::write_stock(&mut **tx, id, new_stock).await
    }

    /// Writes every mutable field except stock for a locked item.
    pub async fn update_item(&mut self, update: &ItemUpdate) -> DbResult<bool> {
        let tx = self.conn()?;
        item::update_fields(&mut **tx, update).await
    }

    /// Re-reads an item inside the transaction (sees uncommitted writes).
    pub async fn fetch_item(&mut self, id: i64) -> DbResult<Option<Item>> {
        let tx = self.conn()?;
        item::fetch_by_id(&mut **tx, id).await
    }

    pub async fn append_movement(&mut self, movement: &NewMovement) -> DbResult<Movement> {
        let tx = self.conn()?;
        movement::insert_movement(&mut **tx, movement).await
    }

    pub async fn commit(mut self) -> DbResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DbError::TransactionFailed("transaction already finished".to_string()))?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        self.check_held_time();
        Ok(())
    }

    pub async fn rollback(mut self) -> DbResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        self.check_held_time();
        Ok(())
    }

    /// Time since `BEGIN`.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn check_held_time(&self) {
        let held = self.elapsed();
        if held > self.leak_threshold {
            warn!(
                held_ms = held.as_millis() as u64,
                threshold_ms = self.leak_threshold.as_millis() as u64,
                "Stock transaction held its connection past the leak-detection threshold"
            );
        }
    }
}

impl Drop for StockTx {
    fn drop(&mut self) {
        if self.tx.is_some() {
            debug!("Stock transaction dropped without commit, rolling back");
            self.check_held_time();
        }
    }
}

impl std::fmt::Debug for StockTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockTx")
            .field("open", &self.tx.is_some())
            .field("elapsed", &self.elapsed())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
