//! # Domain Types
//!
//! Records shared by every layer of the inventory back office.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Category ◄──── category_id ───┐        ┌─── supplier_id ────► Supplier│
//! │                                 │        │                              │
//! │                              ┌──┴────────┴──┐                           │
//! │                              │     Item     │  code (unique, A-Z0-9)    │
//! │                              │              │  prices in cents          │
//! │                              │              │  current/min stock        │
//! │                              └──────┬───────┘                           │
//! │                                     │ 1                                 │
//! │                                     │                                   │
//! │                                     │ *                                 │
//! │                              ┌──────┴───────┐                           │
//! │                              │   Movement   │  append-only audit row    │
//! │                              │ before/after │  ENTRY | EXIT | ADJUSTMENT│
//! │                              └──────────────┘                           │
//! │                                                                         │
//! │   User (username, SHA-256 digest, role) - consumed by Authenticator     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::price::Price;

// =============================================================================
// Item
// =============================================================================

/// A stockable product in the catalog.
///
/// Read model: includes the joined category and supplier names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    /// Surrogate key assigned by the store.
    pub id: i64,

    /// Business key, uppercase alphanumerics.
    pub code: String,

    pub name: String,

    pub description: Option<String>,

    pub category_id: Option<i64>,

    /// Joined from `categories.name`.
    pub category_name: Option<String>,

    pub supplier_id: Option<i64>,

    /// Joined from `suppliers.name`.
    pub supplier_name: Option<String>,

    /// Purchase price in cents.
    pub purchase_price_cents: i64,

    /// Sale price in cents.
    pub sale_price_cents: i64,

    pub current_stock: i64,

    pub min_stock: i64,

    /// `false` once retired.
    pub active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    #[inline]
    pub fn purchase_price(&self) -> Price {
        Price::from_cents(self.purchase_price_cents)
    }

    #[inline]
    pub fn sale_price(&self) -> Price {
        Price::from_cents(self.sale_price_cents)
    }

    /// Low stock means `current_stock <= min_stock`.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self.current_stock, self.min_stock)
    }

    /// Markup over purchase price, in basis points.
    pub fn profit_margin_bps(&self) -> i64 {
        self.sale_price().markup_bps(self.purchase_price())
    }

    /// Stock valued at purchase price.
    pub fn inventory_value(&self) -> Price {
        self.purchase_price().times(self.current_stock)
    }
}

/// Low-stock rule shared by the service and the store query.
#[inline]
pub fn is_low_stock(current_stock: i64, min_stock: i64) -> bool {
    current_stock <= min_stock
}

/// Raw, unvalidated item fields as received from a caller.
///
/// Everything is optional here; the validator decides what is required
/// for insert versus update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub id: Option<i64>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub purchase_price: Option<Price>,
    pub sale_price: Option<Price>,
    pub current_stock: Option<i64>,
    pub min_stock: Option<i64>,
    pub active: Option<bool>,
}

/// A validated, normalized item ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub purchase_price: Price,
    pub sale_price: Price,
    pub current_stock: i64,
    pub min_stock: i64,
    pub active: bool,
}

/// A validated, normalized update. `code` is immutable and absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub purchase_price: Price,
    pub sale_price: Price,
    pub current_stock: i64,
    pub min_stock: i64,
    pub active: bool,
}

// =============================================================================
// Reference Data
// =============================================================================

/// Item classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Item source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Movements
// =============================================================================

/// Direction of a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    /// Stock received.
    Entry,
    /// Stock removed.
    Exit,
    /// Absolute correction (set-stock, item update).
    Adjustment,
}

impl MovementKind {
    /// ENTRY for a positive delta, EXIT otherwise.
    #[inline]
    pub fn for_delta(delta: i64) -> Self {
        if delta > 0 {
            MovementKind::Entry
        } else {
            MovementKind::Exit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entry => "ENTRY",
            MovementKind::Exit => "EXIT",
            MovementKind::Adjustment => "ADJUSTMENT",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audited stock change. Never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Movement {
    pub id: i64,
    pub item_id: i64,
    pub kind: MovementKind,
    /// Magnitude of the change, always positive.
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub reason: Option<String>,
    /// Caller identity that made the change.
    pub user: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl Movement {
    /// Signed change implied by the snapshot.
    #[inline]
    pub fn signed_delta(&self) -> i64 {
        self.stock_after - self.stock_before
    }

    /// Checks that kind, quantity and snapshots agree and the result is not negative.
    pub fn is_consistent(&self) -> bool {
        let delta = self.signed_delta();
        let kind_ok = match self.kind {
            MovementKind::Entry => delta > 0,
            MovementKind::Exit => delta < 0,
            MovementKind::Adjustment => delta != 0,
        };
        kind_ok && self.quantity == delta.abs() && self.stock_after >= 0
    }
}

/// A movement about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub item_id: i64,
    pub kind: MovementKind,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub reason: Option<String>,
    pub user: String,
    /// Store assigns `now()` when absent.
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewMovement {
    /// Builds the audit row for `stock_before -> stock_after`.
    ///
    /// `kind` is derived from the sign unless `adjustment` is set.
    pub fn for_change(
        item_id: i64,
        stock_before: i64,
        stock_after: i64,
        adjustment: bool,
        reason: Option<String>,
        user: impl Into<String>,
    ) -> Self {
        let delta = stock_after - stock_before;
        let kind = if adjustment {
            MovementKind::Adjustment
        } else {
            MovementKind::for_delta(delta)
        };
        NewMovement {
            item_id,
            kind,
            quantity: delta.abs(),
            stock_before,
            stock_after,
            reason,
            user: user.into(),
            timestamp: None,
        }
    }
}

// =============================================================================
// Users & Roles
// =============================================================================

/// Caller role. Ordered: `ReadOnly < Operator < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    ReadOnly,
    Operator,
    Admin,
}

impl Role {
    /// True if this role is at least `required`.
    #[inline]
    pub fn satisfies(&self, required: Role) -> bool {
        *self >= required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ReadOnly => "READONLY",
            Role::Operator => "OPERATOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "OPERATOR" => Ok(Role::Operator),
            "READONLY" => Ok(Role::ReadOnly),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A user account. `password_hash` is a lowercase SHA-256 hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
