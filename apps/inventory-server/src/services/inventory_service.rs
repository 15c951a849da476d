//! # Inventory Service
//!
//! The one place business rules run. The facade hands it already-typed
//! arguments plus the caller's username; it validates, talks to the
//! store and returns the canonical record.
//!
//! ## Stock Change Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  adjust_stock(id, delta)                                                │
//! │       │                                                                 │
//! │       ├── id > 0, delta != 0            (fail fast, nothing opened)     │
//! │       ▼                                                                 │
//! │  begin_stock_tx ─► lock_item(id)         NOT_FOUND / retired → abort    │
//! │       │                                                                 │
//! │       ├── before + delta < 0 ?           INSUFFICIENT_STOCK → rollback  │
//! │       ├── before + delta > MAX_STOCK ?   VALIDATION_ERROR   → rollback  │
//! │       ▼                                                                 │
//! │  set_item_stock ─► append_movement ─► fetch_item ─► commit              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Outcome { item, warnings: ["low stock"]? }                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `set_stock`, `register_entry`, `register_exit` and the stock part of
//! `update_item` all go through the same transaction, so every stock
//! change leaves exactly one movement row.

use tracing::{debug, info, warn};

use ferreteria_core::validation::{
    validate_delta, validate_for_insert, validate_for_update, validate_id, validate_quantity,
    validate_search_code, validate_search_name, validate_stock_level,
};
use ferreteria_core::{
    Category, CoreError, Item, ItemDraft, Movement, NewMovement, Supplier, ValidationError,
    LOW_STOCK_WARNING,
};
use ferreteria_db::{Database, DbError, StockTx};

use crate::error::{ServiceError, ServiceResult};

/// Default movement reason for stock changes made through `update_item`.
const UPDATE_REASON: &str = "item update";

/// Default movement reason for `set_stock`.
const SET_STOCK_REASON: &str = "stock correction";

/// A result plus the non-fatal warnings it produced.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Outcome<T> {
    fn plain(value: T) -> Self {
        Outcome {
            value,
            warnings: Vec::new(),
        }
    }
}

impl Outcome<Item> {
    /// Attaches the low-stock warning when the item ended at or below its minimum.
    fn for_item(item: Item) -> Self {
        let mut warnings = Vec::new();
        if item.is_low_stock() {
            warn!(
                code = %item.code,
                current_stock = item.current_stock,
                min_stock = item.min_stock,
                "Item at or below minimum stock"
            );
            warnings.push(LOW_STOCK_WARNING.to_string());
        }
        Outcome { value: item, warnings }
    }
}

/// Result of `set_stock`: unchanged when the level already matched.
#[derive(Debug, Clone)]
pub struct StockSet {
    pub item: Item,
    pub changed: bool,
}

/// Inventory operations over the store.
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    pub fn new(db: Database) -> Self {
        InventoryService { db }
    }

    // =========================================================================
    // Catalog writes
    // =========================================================================

    /// Registers a new item.
    ///
    /// ## Returns
    /// * `DUPLICATE_CODE` - the normalized code is already taken (active or retired)
    /// * `VALIDATION_ERROR` - field rules or unknown category / supplier
    pub async fn register_item(&self, draft: &ItemDraft) -> ServiceResult<Outcome<Item>> {
        let item = validate_for_insert(draft)?;
        self.check_references(item.category_id, item.supplier_id)
            .await?;

        if self.db.items().exists_by_code(&item.code, None).await? {
            return Err(CoreError::DuplicateCode(item.code).into());
        }

        // a concurrent insert can still win the race; UNIQUE(code) catches it
        let stored = match self.db.items().insert(&item).await {
            Ok(stored) => stored,
            Err(DbError::UniqueViolation { .. }) => {
                return Err(CoreError::DuplicateCode(item.code).into())
            }
            Err(e) => return Err(e.into()),
        };

        info!(id = stored.id, code = %stored.code, "Item registered");
        Ok(Outcome::for_item(stored))
    }

    /// Replaces the editable fields of an item.
    ///
    /// `code` is immutable. If `currentStock` differs from the stored
    /// level the change is recorded as an ADJUSTMENT movement in the same
    /// transaction.
    pub async fn update_item(
        &self,
        draft: &ItemDraft,
        reason: Option<String>,
        user: &str,
    ) -> ServiceResult<Outcome<Item>> {
        let update = validate_for_update(draft)?;
        // before the transaction: it may hold the only connection
        self.check_references(update.category_id, update.supplier_id)
            .await?;

        let mut tx = self.db.begin_stock_tx().await?;
        let current = lock_writable(&mut tx, update.id).await?;

        tx.update_item(&update).await?;
        if update.current_stock != current.current_stock {
            tx.set_item_stock(update.id, update.current_stock).await?;
            tx.append_movement(&NewMovement::for_change(
                update.id,
                current.current_stock,
                update.current_stock,
                true,
                Some(clean_reason(reason).unwrap_or_else(|| UPDATE_REASON.to_string())),
                user,
            ))
            .await?;
        }

        let updated = fetch_locked(&mut tx, update.id).await?;
        tx.commit().await?;

        info!(id = updated.id, code = %updated.code, user = %user, "Item updated");
        Ok(Outcome::for_item(updated))
    }

    /// Soft-deletes an item. Retired items keep their row and movements.
    pub async fn retire_item(&self, id: i64) -> ServiceResult<Item> {
        validate_id("id", id)?;

        let item = self
            .db
            .items()
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_id(id))?;
        if !item.active {
            return Err(CoreError::ItemRetired(item.code).into());
        }

        self.db.items().soft_delete(id).await?;
        let retired = self
            .db
            .items()
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_id(id))?;

        info!(id, code = %retired.code, "Item retired");
        Ok(retired)
    }

    // =========================================================================
    // Stock changes
    // =========================================================================

    /// Sets an absolute stock level, audited as an ADJUSTMENT.
    ///
    /// A level equal to the current one succeeds without writing anything.
    pub async fn set_stock(
        &self,
        id: i64,
        new_stock: i64,
        reason: Option<String>,
        user: &str,
    ) -> ServiceResult<Outcome<StockSet>> {
        validate_id("id", id)?;
        validate_stock_level("newStock", new_stock)?;

        let mut tx = self.db.begin_stock_tx().await?;
        let current = lock_writable(&mut tx, id).await?;

        if current.current_stock == new_stock {
            tx.rollback().await?;
            debug!(id, stock = new_stock, "Stock already at requested level");
            return Ok(Outcome::plain(StockSet {
                item: current,
                changed: false,
            }));
        }

        tx.set_item_stock(id, new_stock).await?;
        tx.append_movement(&NewMovement::for_change(
            id,
            current.current_stock,
            new_stock,
            true,
            Some(clean_reason(reason).unwrap_or_else(|| SET_STOCK_REASON.to_string())),
            user,
        ))
        .await?;
        let item = fetch_locked(&mut tx, id).await?;
        tx.commit().await?;

        info!(
            id,
            stock_before = current.current_stock,
            stock_after = new_stock,
            user = %user,
            "Stock set"
        );
        let outcome = Outcome::for_item(item);
        Ok(Outcome {
            value: StockSet {
                item: outcome.value,
                changed: true,
            },
            warnings: outcome.warnings,
        })
    }

    /// Applies a signed stock change and records the movement.
    ///
    /// ## Arguments
    /// * `delta` - positive for an entry, negative for an exit, never zero
    /// * `user` - caller identity written to the movement
    ///
    /// ## Returns
    /// * `INSUFFICIENT_STOCK` - the result would be negative; nothing is written
    pub async fn adjust_stock(
        &self,
        id: i64,
        delta: i64,
        reason: Option<String>,
        user: &str,
    ) -> ServiceResult<Outcome<Item>> {
        validate_id("id", id)?;
        if delta == 0 {
            return Err(CoreError::ZeroDelta.into());
        }
        validate_delta(delta)?;

        let mut tx = self.db.begin_stock_tx().await?;
        let current = lock_writable(&mut tx, id).await?;

        let new_stock = current.current_stock.checked_add(delta).ok_or_else(|| {
            ServiceError::InvalidArgument(format!("delta {delta} overflows the stock level"))
        })?;
        if new_stock < 0 {
            warn!(
                code = %current.code,
                available = current.current_stock,
                requested = -delta,
                "Withdrawal refused"
            );
            return Err(CoreError::InsufficientStock {
                code: current.code,
                available: current.current_stock,
                requested: -delta,
            }
            .into());
        }
        validate_stock_level("currentStock", new_stock)?;

        tx.set_item_stock(id, new_stock).await?;
        let movement = tx
            .append_movement(&NewMovement::for_change(
                id,
                current.current_stock,
                new_stock,
                false,
                clean_reason(reason),
                user,
            ))
            .await?;
        let item = fetch_locked(&mut tx, id).await?;
        tx.commit().await?;

        info!(
            id,
            kind = %movement.kind,
            quantity = movement.quantity,
            stock_after = new_stock,
            user = %user,
            "Stock adjusted"
        );
        Ok(Outcome::for_item(item))
    }

    /// Receives `quantity` units.
    pub async fn register_entry(
        &self,
        id: i64,
        quantity: i64,
        reason: Option<String>,
        user: &str,
    ) -> ServiceResult<Outcome<Item>> {
        validate_quantity(quantity)?;
        self.adjust_stock(id, quantity, reason, user).await
    }

    /// Removes `quantity` units.
    pub async fn register_exit(
        &self,
        id: i64,
        quantity: i64,
        reason: Option<String>,
        user: &str,
    ) -> ServiceResult<Outcome<Item>> {
        validate_quantity(quantity)?;
        self.adjust_stock(id, -quantity, reason, user).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Looks up an item by code (trimmed, uppercased). Retired items are found too.
    pub async fn get_by_code(&self, code: &str) -> ServiceResult<Item> {
        let code = validate_search_code(code)?;
        self.db
            .items()
            .find_by_code(&code)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(format!("code {code}")).into())
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<Item> {
        validate_id("id", id)?;
        self.db
            .items()
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_id(id))
    }

    /// Case-insensitive substring search over active items.
    pub async fn search_by_name(&self, fragment: &str) -> ServiceResult<Vec<Item>> {
        let fragment = validate_search_name(fragment)?;
        Ok(self.db.items().search_by_name(&fragment).await?)
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<Item>> {
        Ok(self.db.items().list_active().await?)
    }

    pub async fn list_low_stock(&self) -> ServiceResult<Vec<Item>> {
        Ok(self.db.items().list_low_stock().await?)
    }

    /// Movements of one item, newest first.
    pub async fn list_movements(&self, item_id: i64) -> ServiceResult<Vec<Movement>> {
        validate_id("itemId", item_id)?;
        if !self.db.items().exists_by_id(item_id).await? {
            return Err(not_found_id(item_id));
        }
        Ok(self.db.movements().list_by_item(item_id).await?)
    }

    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.db.categories().list().await?)
    }

    pub async fn list_suppliers(&self) -> ServiceResult<Vec<Supplier>> {
        Ok(self.db.suppliers().list().await?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn check_references(
        &self,
        category_id: Option<i64>,
        supplier_id: Option<i64>,
    ) -> ServiceResult<()> {
        let mut errors = Vec::new();
        if let Some(id) = category_id {
            if !self.db.categories().exists(id).await? {
                errors.push(ValidationError::UnknownReference {
                    field: "categoryId".to_string(),
                    id,
                });
            }
        }
        if let Some(id) = supplier_id {
            if !self.db.suppliers().exists(id).await? {
                errors.push(ValidationError::UnknownReference {
                    field: "supplierId".to_string(),
                    id,
                });
            }
        }
        ferreteria_core::ValidationErrors::check(errors)?;
        Ok(())
    }
}

/// Locks the item and refuses retired ones.
async fn lock_writable(tx: &mut StockTx, id: i64) -> ServiceResult<Item> {
    let item = tx.lock_item(id).await?.ok_or_else(|| not_found_id(id))?;
    if !item.active {
        return Err(CoreError::ItemRetired(item.code).into());
    }
    Ok(item)
}

async fn fetch_locked(tx: &mut StockTx, id: i64) -> ServiceResult<Item> {
    tx.fetch_item(id).await?.ok_or_else(|| not_found_id(id))
}

fn not_found_id(id: i64) -> ServiceError {
    CoreError::ItemNotFound(format!("id {id}")).into()
}

/// Blank reasons are stored as NULL.
fn clean_reason(reason: Option<String>) -> Option<String> {
    reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ferreteria_core::{MovementKind, Price, MAX_STOCK};
    use ferreteria_db::DbConfig;
    use proptest::prelude::*;

    async fn service() -> InventoryService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        InventoryService::new(db)
    }

    fn hammer() -> ItemDraft {
        ItemDraft {
            code: Some("abc1".into()),
            name: Some("Hammer".into()),
            purchase_price: Some(Price::from_cents(1000)),
            sale_price: Some(Price::from_cents(1500)),
            current_stock: Some(5),
            min_stock: Some(2),
            ..Default::default()
        }
    }

    fn update_of(item: &Item) -> ItemDraft {
        ItemDraft {
            id: Some(item.id),
            name: Some(item.name.clone()),
            description: item.description.clone(),
            category_id: item.category_id,
            supplier_id: item.supplier_id,
            purchase_price: Some(item.purchase_price()),
            sale_price: Some(item.sale_price()),
            current_stock: Some(item.current_stock),
            min_stock: Some(item.min_stock),
            active: Some(item.active),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_then_read() {
        let svc = service().await;
        let outcome = svc.register_item(&hammer()).await.unwrap();
        assert!(outcome.warnings.is_empty());

        let item = svc.get_by_code(" abc1 ").await.unwrap();
        assert_eq!(item.code, "ABC1");
        assert_eq!(item.sale_price().to_string(), "15.00");
        assert!(item.active);
    }

    #[tokio::test]
    async fn test_register_ignores_inactive_flag() {
        let svc = service().await;
        let draft = ItemDraft {
            active: Some(false),
            ..hammer()
        };
        let item = svc.register_item(&draft).await.unwrap().value;
        assert!(item.active);
        assert_eq!(svc.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_by_name_folds_accents() {
        let svc = service().await;
        let draft = ItemDraft {
            name: Some("Martillo de Uña".into()),
            ..hammer()
        };
        svc.register_item(&draft).await.unwrap();

        assert_eq!(svc.search_by_name("uña").await.unwrap().len(), 1);
        assert_eq!(svc.search_by_name("UÑA").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let svc = service().await;
        svc.register_item(&hammer()).await.unwrap();

        let err = svc.register_item(&hammer()).await.unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_CODE");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(svc.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_category() {
        let svc = service().await;
        let draft = ItemDraft {
            category_id: Some(999),
            ..hammer()
        };
        let err = svc.register_item(&draft).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("categoryId"));
    }

    #[tokio::test]
    async fn test_register_low_stock_warning() {
        let svc = service().await;
        let draft = ItemDraft {
            current_stock: Some(2),
            ..hammer()
        };
        let outcome = svc.register_item(&draft).await.unwrap();
        assert_eq!(outcome.warnings, vec![LOW_STOCK_WARNING.to_string()]);
    }

    #[tokio::test]
    async fn test_adjust_stock_records_movement() {
        let svc = service().await;
        let item = svc.register_item(&hammer()).await.unwrap().value;

        let outcome = svc
            .adjust_stock(item.id, -3, Some("sale".into()), "alice")
            .await
            .unwrap();
        assert_eq!(outcome.value.current_stock, 2);
        assert_eq!(outcome.warnings, vec![LOW_STOCK_WARNING.to_string()]);

        let movements = svc.list_movements(item.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        let m = &movements[0];
        assert_eq!(m.kind, MovementKind::Exit);
        assert_eq!(m.quantity, 3);
        assert_eq!(m.stock_before, 5);
        assert_eq!(m.stock_after, 2);
        assert_eq!(m.user, "alice");
        assert_eq!(m.reason.as_deref(), Some("sale"));

        let low = svc.list_low_stock().await.unwrap();
        assert!(low.iter().any(|i| i.id == item.id));
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let svc = service().await;
        let item = svc.register_item(&hammer()).await.unwrap().value;

        let err = svc.adjust_stock(item.id, -10, None, "alice").await.unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(svc.get_by_id(item.id).await.unwrap().current_stock, 5);
        assert!(svc.list_movements(item.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_delta_rejected() {
        let svc = service().await;
        let item = svc.register_item(&hammer()).await.unwrap().value;
        let err = svc.adjust_stock(item.id, 0, None, "alice").await.unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_adjust_missing_item() {
        let svc = service().await;
        let err = svc.adjust_stock(42, 1, None, "alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Item not found: id 42");
    }

    #[tokio::test]
    async fn test_set_stock_is_audited() {
        let svc = service().await;
        let item = svc.register_item(&hammer()).await.unwrap().value;

        let outcome = svc.set_stock(item.id, 12, None, "bob").await.unwrap();
        assert!(outcome.value.changed);
        assert_eq!(outcome.value.item.current_stock, 12);

        let movements = svc.list_movements(item.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Adjustment);
        assert_eq!(movements[0].quantity, 7);
        assert_eq!(movements[0].reason.as_deref(), Some(SET_STOCK_REASON));

        let unchanged = svc.set_stock(item.id, 12, None, "bob").await.unwrap();
        assert!(!unchanged.value.changed);
        assert_eq!(svc.list_movements(item.id).await.unwrap().len(), 1);

        let err = svc.set_stock(item.id, -1, None, "bob").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_stock_ceiling_at_max_prices() {
        let svc = service().await;
        let draft = ItemDraft {
            purchase_price: Some(Price::from_cents(99_999_000)),
            sale_price: Some(Price::from_cents(99_999_999)),
            ..hammer()
        };
        let item = svc.register_item(&draft).await.unwrap().value;

        let err = svc
            .set_stock(item.id, 1_000_000_000_000, None, "op")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let at_max = svc.set_stock(item.id, MAX_STOCK, None, "op").await.unwrap();
        assert_eq!(at_max.value.item.current_stock, MAX_STOCK);

        let err = svc.adjust_stock(item.id, 1, None, "op").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        let err = svc.adjust_stock(item.id, i64::MIN, None, "op").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let stored = svc.get_by_id(item.id).await.unwrap();
        assert_eq!(stored.current_stock, MAX_STOCK);
        assert_eq!(stored.inventory_value().cents(), 99_999_000 * MAX_STOCK);
        assert_eq!(svc.list_movements(item.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_entry_and_exit_helpers() {
        let svc = service().await;
        let item = svc.register_item(&hammer()).await.unwrap().value;

        svc.register_entry(item.id, 10, Some("delivery".into()), "op")
            .await
            .unwrap();
        let after = svc.register_exit(item.id, 4, None, "op").await.unwrap();
        assert_eq!(after.value.current_stock, 11);

        let err = svc.register_exit(item.id, 0, None, "op").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let movements = svc.list_movements(item.id).await.unwrap();
        assert_eq!(movements.len(), 2);
        // newest first
        assert_eq!(movements[0].kind, MovementKind::Exit);
        assert_eq!(movements[1].kind, MovementKind::Entry);
    }

    #[tokio::test]
    async fn test_update_item_keeps_code_and_audits_stock() {
        let svc = service().await;
        let item = svc.register_item(&hammer()).await.unwrap().value;

        let mut draft = update_of(&item);
        draft.code = Some("OTHER99".into());
        draft.name = Some("Claw hammer".into());
        draft.current_stock = Some(8);

        let updated = svc
            .update_item(&draft, None, "admin")
            .await
            .unwrap()
            .value;
        assert_eq!(updated.code, "ABC1");
        assert_eq!(updated.name, "Claw hammer");
        assert_eq!(updated.current_stock, 8);

        let movements = svc.list_movements(item.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Adjustment);
        assert_eq!(movements[0].reason.as_deref(), Some(UPDATE_REASON));
        assert_eq!(movements[0].user, "admin");
    }

    #[tokio::test]
    async fn test_update_without_stock_change_records_nothing() {
        let svc = service().await;
        let item = svc.register_item(&hammer()).await.unwrap().value;

        let mut draft = update_of(&item);
        draft.min_stock = Some(1);
        svc.update_item(&draft, None, "admin").await.unwrap();

        assert!(svc.list_movements(item.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retired_item_is_terminal() {
        let svc = service().await;
        let item = svc.register_item(&hammer()).await.unwrap().value;

        let retired = svc.retire_item(item.id).await.unwrap();
        assert!(!retired.active);

        // still found by key, gone from listings
        assert!(!svc.get_by_code("ABC1").await.unwrap().active);
        assert!(svc.list_all().await.unwrap().is_empty());
        assert!(svc.search_by_name("ham").await.unwrap().is_empty());

        let err = svc.adjust_stock(item.id, 1, None, "op").await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::ItemRetired(_))));
        assert!(svc.retire_item(item.id).await.is_err());
        assert!(svc.update_item(&update_of(&item), None, "admin").await.is_err());

        // the code stays taken
        let err = svc.register_item(&hammer()).await.unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_CODE");
    }

    #[tokio::test]
    async fn test_lookup_validation() {
        let svc = service().await;
        assert_eq!(svc.get_by_code("a").await.unwrap_err().code(), "VALIDATION_ERROR");
        assert_eq!(svc.get_by_id(0).await.unwrap_err().code(), "VALIDATION_ERROR");
        assert_eq!(svc.list_movements(7).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            svc.get_by_code("NOPE1").await.unwrap_err().to_string(),
            "Item not found: code NOPE1"
        );
    }

    #[tokio::test]
    async fn test_reference_lists() {
        let svc = service().await;
        assert_eq!(svc.list_categories().await.unwrap().len(), 6);
        assert_eq!(svc.list_suppliers().await.unwrap().len(), 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn test_stock_is_conserved(deltas in prop::collection::vec(-8i64..8, 1..16)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            rt.block_on(async {
                let svc = service().await;
                let item = svc.register_item(&hammer()).await.unwrap().value;

                let mut expected = item.current_stock;
                let mut applied = 0usize;
                for delta in deltas {
                    match svc.adjust_stock(item.id, delta, None, "prop").await {
                        Ok(outcome) => {
                            expected += delta;
                            applied += 1;
                            prop_assert_eq!(outcome.value.current_stock, expected);
                        }
                        Err(err) => {
                            prop_assert!(delta == 0 || expected + delta < 0, "unexpected {}", err);
                        }
                    }
                }

                let stored = svc.get_by_id(item.id).await.unwrap();
                prop_assert_eq!(stored.current_stock, expected);
                prop_assert!(stored.current_stock >= 0);

                let movements = svc.list_movements(item.id).await.unwrap();
                prop_assert_eq!(movements.len(), applied);
                for m in &movements {
                    prop_assert!(m.is_consistent());
                }
                let net: i64 = movements.iter().map(|m| m.signed_delta()).sum();
                prop_assert_eq!(item.current_stock + net, stored.current_stock);
                Ok(())
            })?;
        }
    }
}
