//! # Database Migrations
//!
//! The inventory schema ships inside the binary (`sqlx::migrate!`).
//!
//! ```text
//! migrations/sqlite/
//!   001_inventory_schema.sql   items, categories, suppliers, movements, users,
//!                              low-stock index, append-only triggers
//!   002_reference_data.sql     starter categories and suppliers
//!   003_item_name_folding.sql  items.name_folded for case-insensitive search
//! ```
//!
//! SQL can only fold ASCII, so after any migration runs the Unicode fold
//! of every item name is rewritten from Rust.
//!
//! Applied versions are tracked in `_sqlx_migrations`. A file that has
//! been applied anywhere is frozen; changes go in a new `NNN_*.sql`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::ItemRepository;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far a database is behind the embedded schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn pending(&self) -> usize {
        self.embedded.saturating_sub(self.applied)
    }

    pub fn is_current(&self) -> bool {
        self.pending() == 0
    }
}

/// Applies every embedded migration the database hasn't seen yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = migration_status(pool).await?;
    if before.is_current() {
        debug!(applied = before.applied, "Schema up to date");
        return Ok(());
    }

    MIGRATOR.run(pool).await?;
    let refolded = ItemRepository::new(pool.clone()).refold_names().await?;
    info!(applied = before.pending(), refolded, "Schema migrations applied");
    Ok(())
}

/// Counts embedded versus applied migrations.
///
/// A fresh database without the bookkeeping table counts as zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let has_table: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    let applied: i64 = if has_table == 0 {
        0
    } else {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    };

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: applied.max(0) as usize,
    })
}
