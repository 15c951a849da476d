//! # ferreteria-core: Pure Inventory Domain
//!
//! Records, pricing, validation and authentication rules for the
//! hardware-store inventory back office. Zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Ferreteria Inventory Architecture                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          HTTP POST /InventarioService (Basic auth)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            Facade ──► Inventory Service                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ferreteria-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐ │   │
//! │  │   │   types   │  │   price   │  │ validation │  │   auth    │ │   │
//! │  │   │   Item    │  │   Price   │  │  insert /  │  │  verify   │ │   │
//! │  │   │ Movement  │  │  markup   │  │  update    │  │  roles    │ │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 ferreteria-db (Store)                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Item, Category, Supplier, Movement, User, Role
//! - [`price`] - Fixed-point price in cents
//! - [`validation`] - Item rules (insert / update / lookups)
//! - [`auth`] - Authenticator and password strength
//! - [`operation`] - Operation catalog and required roles
//! - [`error`] - Domain error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod operation;
pub mod price;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::Authenticator;
pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use operation::Operation;
pub use price::Price;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Item code length bounds (after trim + uppercase).
pub const CODE_MIN_LEN: usize = 4;
pub const CODE_MAX_LEN: usize = 20;

/// Item name length bounds (after trim).
pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 200;

/// Longest accepted description.
pub const DESCRIPTION_MAX_LEN: usize = 1000;

/// Minimum length of a lookup code or name fragment.
pub const SEARCH_MIN_LEN: usize = 2;

/// Ceiling for `min_stock`.
pub const MAX_MIN_STOCK: i64 = 10_000;

/// Ceiling for any stock level or single movement quantity (32-bit `INT`).
pub const MAX_STOCK: i64 = i32::MAX as i64;

/// Warning attached to responses when an item ends at or below its minimum.
pub const LOW_STOCK_WARNING: &str = "low stock";
