//! # Repository Module
//!
//! One repository per table. Each is a cheap handle around the pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database                                                               │
//! │  ├── items()       → ItemRepository      lookups, insert, retire        │
//! │  ├── categories()  → CategoryRepository  reference data                 │
//! │  ├── suppliers()   → SupplierRepository  reference data                 │
//! │  ├── movements()   → MovementRepository  append-only audit log          │
//! │  ├── users()       → UserRepository      accounts for the Authenticator │
//! │  └── begin_stock_tx() → StockTx          locked stock change + audit    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod category;
pub mod item;
pub mod movement;
pub mod supplier;
pub mod user;

pub use category::CategoryRepository;
pub use item::ItemRepository;
pub use movement::MovementRepository;
pub use supplier::{NewSupplier, SupplierRepository};
pub use user::UserRepository;
