//! Response envelope and payload shapes.
//!
//! ```json
//! {
//!   "successful": true,
//!   "message": "Item found",
//!   "payload": { "type": "item", "data": { "code": "ABC1", ... } },
//!   "warnings": []
//! }
//! ```
//!
//! Failures carry `errorCode` and `errorKind` instead of a payload.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ferreteria_core::{Category, Item, Movement, MovementKind, Price, Supplier};

use crate::error::{ErrorKind, ServiceError};
use crate::services::HealthReport;

/// Every facade response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub successful: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    pub warnings: Vec<String>,
}

impl Envelope {
    pub fn ok(message: impl Into<String>, payload: Option<Payload>) -> Self {
        Envelope {
            successful: true,
            message: message.into(),
            error_code: None,
            error_kind: None,
            payload,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Failure envelope. The message is the redacted public one.
    pub fn error(err: &ServiceError) -> Self {
        Envelope {
            successful: false,
            message: err.public_message(),
            error_code: Some(err.code()),
            error_kind: Some(err.kind()),
            payload: None,
            warnings: Vec::new(),
        }
    }

    /// HTTP status this envelope travels with.
    pub fn http_status(&self) -> axum::http::StatusCode {
        match self.error_kind {
            Some(kind) => kind.http_status(),
            None => axum::http::StatusCode::OK,
        }
    }
}

/// Tagged payload: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Payload {
    Item(ItemDto),
    Items(Vec<ItemDto>),
    Categories(Vec<Category>),
    Suppliers(Vec<Supplier>),
    Movements(Vec<MovementDto>),
    Health(HealthReport),
}

impl Payload {
    pub fn item(item: &Item) -> Self {
        Payload::Item(ItemDto::from(item))
    }

    pub fn items(items: &[Item]) -> Self {
        Payload::Items(items.iter().map(ItemDto::from).collect())
    }

    pub fn movements(movements: &[Movement]) -> Self {
        Payload::Movements(movements.iter().map(MovementDto::from).collect())
    }
}

/// Item as seen by clients, with derived figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub supplier_id: Option<i64>,
    pub supplier_name: Option<String>,
    pub purchase_price: Price,
    pub sale_price: Price,
    pub current_stock: i64,
    pub min_stock: i64,
    pub active: bool,
    pub low_stock: bool,
    /// Markup over purchase price, percent with two decimals.
    pub profit_margin: String,
    pub inventory_value: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Item> for ItemDto {
    fn from(item: &Item) -> Self {
        ItemDto {
            id: item.id,
            code: item.code.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            category_id: item.category_id,
            category_name: item.category_name.clone(),
            supplier_id: item.supplier_id,
            supplier_name: item.supplier_name.clone(),
            purchase_price: item.purchase_price(),
            sale_price: item.sale_price(),
            current_stock: item.current_stock,
            min_stock: item.min_stock,
            active: item.active,
            low_stock: item.is_low_stock(),
            profit_margin: percent_from_bps(item.profit_margin_bps()),
            inventory_value: item.inventory_value(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementDto {
    pub id: i64,
    pub item_id: i64,
    pub kind: MovementKind,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub reason: Option<String>,
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Movement> for MovementDto {
    fn from(m: &Movement) -> Self {
        MovementDto {
            id: m.id,
            item_id: m.item_id,
            kind: m.kind,
            quantity: m.quantity,
            stock_before: m.stock_before,
            stock_after: m.stock_after,
            reason: m.reason.clone(),
            user: m.user.clone(),
            timestamp: m.timestamp,
        }
    }
}

/// 5000 bps -> "50.00"
fn percent_from_bps(bps: i64) -> String {
    // same layout as a price: hundredths of a percent
    Price::from_cents(bps).to_string()
}
