//! # ferreteria-db: Store for the Inventory Back Office
//!
//! Persistence for items, categories, suppliers, movements and users,
//! on SQLite through a pooled sqlx connection.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Ferreteria Inventory Data Flow                      │
//! │                                                                         │
//! │  InventoryService (apps/inventory-server)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  ferreteria-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  item, user,  │    │  (embedded)  │  │   │
//! │  │   │               │    │  movement ... │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│               │    │ 001 schema   │  │   │
//! │  │   │ StockTx       │    │               │    │ 002 refdata  │  │   │
//! │  │   │               │    │               │    │ 003 folding  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table
//! - [`transaction`] - Locked stock change plus its audit row
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ferreteria_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("sqlite://inventario.db")).await?;
//! let low = db.items().list_low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod transaction;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, PoolStatus};
pub use transaction::StockTx;

// Repository re-exports for convenience
pub use repository::{
    CategoryRepository, ItemRepository, MovementRepository, NewSupplier, SupplierRepository,
    UserRepository,
};
