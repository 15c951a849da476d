//! # Validation Module
//!
//! Field-level and cross-field rules for items, applied before any write.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Facade                                                       │
//! │  └── Argument types (integer, price, string)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields (insert vs update)                                │
//! │  ├── Formats and lengths                                               │
//! │  └── Price bounds, sale > purchase, markup ≤ 10x                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Inventory Service                                            │
//! │  └── Rules needing the store (duplicate code, existence, stock ≥ 0)    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite                                                       │
//! │  └── UNIQUE(code), CHECK(current_stock >= 0), foreign keys             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All checks run; the caller gets every violation at once, not just the first.
//!
//! ## Usage
//! ```rust
//! use ferreteria_core::types::ItemDraft;
//! use ferreteria_core::validation::validate_for_insert;
//!
//! let draft = ItemDraft {
//!     code: Some(" abc1 ".into()),
//!     name: Some("Hammer".into()),
//!     purchase_price: Some("10.00".parse().unwrap()),
//!     sale_price: Some("15.00".parse().unwrap()),
//!     current_stock: Some(5),
//!     min_stock: Some(2),
//!     ..Default::default()
//! };
//!
//! let item = validate_for_insert(&draft).unwrap();
//! assert_eq!(item.code, "ABC1");
//! assert!(item.active);
//! ```

use crate::error::{ValidationError, ValidationErrors};
use crate::price::{Price, MAX_MARKUP_RATIO, MAX_PRICE, MIN_PRICE};
use crate::types::{ItemDraft, ItemUpdate, NewItem};
use crate::{
    CODE_MAX_LEN, CODE_MIN_LEN, DESCRIPTION_MAX_LEN, MAX_MIN_STOCK, MAX_STOCK, NAME_MAX_LEN,
    NAME_MIN_LEN, SEARCH_MIN_LEN,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationErrors>;

// =============================================================================
// Normalization
// =============================================================================

/// Trim + uppercase.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Unicode lowercase used for name search, so "UÑA" finds "Martillo de Uña".
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Trimmed description, `None` when empty.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Item Validators
// =============================================================================

/// Validates a draft for insertion and returns the normalized item.
///
/// ## Rules
/// - Required: `code`, `name`, `purchasePrice`, `salePrice`, `currentStock`, `minStock`
/// - Every rule in [`check_fields`]
/// - New items are always active; a supplied `active` is ignored
pub fn validate_for_insert(draft: &ItemDraft) -> ValidationResult<NewItem> {
    let mut errors = Vec::new();

    if present(&draft.code).is_none() {
        errors.push(ValidationError::required("code"));
    }
    check_required_common(draft, &mut errors);
    check_fields(draft, &mut errors);
    ValidationErrors::check(errors)?;

    // required fields were checked above
    match (
        present(&draft.code),
        present(&draft.name),
        draft.purchase_price,
        draft.sale_price,
        draft.current_stock,
        draft.min_stock,
    ) {
        (Some(code), Some(name), Some(purchase), Some(sale), Some(stock), Some(min)) => {
            Ok(NewItem {
                code: normalize_code(code),
                name: name.to_string(),
                description: normalize_description(draft.description.as_deref()),
                category_id: draft.category_id,
                supplier_id: draft.supplier_id,
                purchase_price: purchase,
                sale_price: sale,
                current_stock: stock,
                min_stock: min,
                active: true,
            })
        }
        _ => Err(ValidationError::required("item").into()),
    }
}

/// Validates a draft for update and returns the normalized change set.
///
/// ## Rules
/// - Required: `id > 0` plus everything required on insert except `code`
/// - A supplied `code` is ignored (immutable)
pub fn validate_for_update(draft: &ItemDraft) -> ValidationResult<ItemUpdate> {
    let mut errors = Vec::new();

    match draft.id {
        None => errors.push(ValidationError::required("id")),
        Some(id) if id <= 0 => errors.push(ValidationError::MustBePositive {
            field: "id".to_string(),
        }),
        Some(_) => {}
    }
    check_required_common(draft, &mut errors);

    // code is immutable on update, skip its format check
    let without_code = ItemDraft {
        code: None,
        ..draft.clone()
    };
    check_fields(&without_code, &mut errors);
    ValidationErrors::check(errors)?;

    match (
        draft.id,
        present(&draft.name),
        draft.purchase_price,
        draft.sale_price,
        draft.current_stock,
        draft.min_stock,
    ) {
        (Some(id), Some(name), Some(purchase), Some(sale), Some(stock), Some(min)) => {
            Ok(ItemUpdate {
                id,
                name: name.to_string(),
                description: normalize_description(draft.description.as_deref()),
                category_id: draft.category_id,
                supplier_id: draft.supplier_id,
                purchase_price: purchase,
                sale_price: sale,
                current_stock: stock,
                min_stock: min,
                active: draft.active.unwrap_or(true),
            })
        }
        _ => Err(ValidationError::required("item").into()),
    }
}

fn check_required_common(draft: &ItemDraft, errors: &mut Vec<ValidationError>) {
    if present(&draft.name).is_none() {
        errors.push(ValidationError::required("name"));
    }
    if draft.purchase_price.is_none() {
        errors.push(ValidationError::required("purchasePrice"));
    }
    if draft.sale_price.is_none() {
        errors.push(ValidationError::required("salePrice"));
    }
    if draft.current_stock.is_none() {
        errors.push(ValidationError::required("currentStock"));
    }
    if draft.min_stock.is_none() {
        errors.push(ValidationError::required("minStock"));
    }
}

/// Format, length and range rules for whatever fields are present.
///
/// Missing fields are the business of the required checks, so each rule
/// here only looks at values that were supplied.
pub fn check_fields(draft: &ItemDraft, errors: &mut Vec<ValidationError>) {
    if let Some(code) = present(&draft.code) {
        if let Err(e) = check_code_format(&normalize_code(code)) {
            errors.push(e);
        }
    }

    if let Some(name) = present(&draft.name) {
        let len = name.chars().count();
        if len < NAME_MIN_LEN {
            errors.push(ValidationError::TooShort {
                field: "name".to_string(),
                min: NAME_MIN_LEN,
            });
        }
        if len > NAME_MAX_LEN {
            errors.push(ValidationError::TooLong {
                field: "name".to_string(),
                max: NAME_MAX_LEN,
            });
        }
    }

    if let Some(description) = normalize_description(draft.description.as_deref()) {
        if description.chars().count() > DESCRIPTION_MAX_LEN {
            errors.push(ValidationError::TooLong {
                field: "description".to_string(),
                max: DESCRIPTION_MAX_LEN,
            });
        }
    }

    for (field, id) in [("categoryId", draft.category_id), ("supplierId", draft.supplier_id)] {
        if matches!(id, Some(id) if id <= 0) {
            errors.push(ValidationError::MustBePositive {
                field: field.to_string(),
            });
        }
    }

    check_prices(draft.purchase_price, draft.sale_price, errors);

    if let Some(stock) = draft.current_stock {
        if let Err(e) = check_stock_level("currentStock", stock) {
            errors.push(e);
        }
    }

    if let Some(min) = draft.min_stock {
        if min < 0 {
            errors.push(ValidationError::Negative {
                field: "minStock".to_string(),
            });
        } else if min > MAX_MIN_STOCK {
            errors.push(ValidationError::OutOfRange {
                field: "minStock".to_string(),
                min: "0".to_string(),
                max: MAX_MIN_STOCK.to_string(),
            });
        }
    }
}

/// Price bounds plus the cross-field rules.
///
/// ```text
/// purchase ∈ [0.01, 999999.99]
/// sale     ∈ [0.01, 999999.99]
/// sale > purchase
/// (sale - purchase) / purchase ≤ 10
/// ```
fn check_prices(purchase: Option<Price>, sale: Option<Price>, errors: &mut Vec<ValidationError>) {
    let out_of_range = |field: &str| ValidationError::OutOfRange {
        field: field.to_string(),
        min: MIN_PRICE.to_string(),
        max: MAX_PRICE.to_string(),
    };

    if let Some(p) = purchase {
        if !p.in_range() {
            errors.push(out_of_range("purchasePrice"));
        }
    }
    if let Some(s) = sale {
        if !s.in_range() {
            errors.push(out_of_range("salePrice"));
        }
    }

    if let (Some(p), Some(s)) = (purchase, sale) {
        if s <= p {
            errors.push(ValidationError::MustExceed {
                field: "salePrice".to_string(),
                other: "purchasePrice".to_string(),
            });
        } else if !s.markup_within(p, MAX_MARKUP_RATIO) {
            errors.push(ValidationError::Excessive {
                field: "salePrice".to_string(),
                reason: format!("markup over purchase price exceeds {}%", MAX_MARKUP_RATIO * 100),
            });
        }
    }
}

fn check_code_format(code: &str) -> Result<(), ValidationError> {
    let len = code.chars().count();
    let ok = (CODE_MIN_LEN..=CODE_MAX_LEN).contains(&len)
        && code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: format!(
                "must be {CODE_MIN_LEN} to {CODE_MAX_LEN} uppercase letters or digits"
            ),
        })
    }
}

// =============================================================================
// Lookup Validators
// =============================================================================

/// Validates a lookup code and returns it normalized.
///
/// ## Rules
/// - Required
/// - At least 2 characters after trimming
pub fn validate_search_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ValidationError::required("code").into());
    }
    if code.chars().count() < SEARCH_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "code".to_string(),
            min: SEARCH_MIN_LEN,
        }
        .into());
    }
    Ok(normalize_code(code))
}

/// Validates a name fragment for substring search and returns it trimmed.
pub fn validate_search_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::required("name").into());
    }
    if name.chars().count() < SEARCH_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: SEARCH_MIN_LEN,
        }
        .into());
    }
    Ok(name.to_string())
}

/// Validates a surrogate id.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}

fn check_stock_level(field: &str, stock: i64) -> Result<(), ValidationError> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if stock > MAX_STOCK {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: MAX_STOCK.to_string(),
        });
    }
    Ok(())
}

/// Validates an absolute stock level: `0..=MAX_STOCK`.
pub fn validate_stock_level(field: &str, stock: i64) -> ValidationResult<()> {
    check_stock_level(field, stock).map_err(Into::into)
}

/// Validates a movement quantity (entry / exit helpers).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    validate_stock_level("quantity", qty)
}

/// Validates the size of a signed stock change. Zero is the caller's
/// business (it is a domain error, not a validation one).
pub fn validate_delta(delta: i64) -> ValidationResult<()> {
    if delta.unsigned_abs() > MAX_STOCK.unsigned_abs() {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: (-MAX_STOCK).to_string(),
            max: MAX_STOCK.to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

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

    fn messages(errs: &ValidationErrors) -> Vec<String> {
        errs.errors().iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_insert_normalizes() {
        let draft = ItemDraft {
            code: Some("  abc1 ".into()),
            name: Some("  Hammer  ".into()),
            description: Some("   ".into()),
            ..hammer()
        };
        let item = validate_for_insert(&draft).unwrap();
        assert_eq!(item.code, "ABC1");
        assert_eq!(item.name, "Hammer");
        assert_eq!(item.description, None);
        assert!(item.active);
    }

    #[test]
    fn test_insert_reports_all_missing_fields() {
        let errs = validate_for_insert(&ItemDraft::default()).unwrap_err();
        assert_eq!(
            messages(&errs),
            vec![
                "code is required",
                "name is required",
                "purchasePrice is required",
                "salePrice is required",
                "currentStock is required",
                "minStock is required",
            ]
        );
    }

    #[test]
    fn test_code_format() {
        for bad in ["AB", "ABC-1", "A".repeat(21).as_str(), "ÑAND"] {
            let draft = ItemDraft {
                code: Some(bad.to_string()),
                ..hammer()
            };
            assert!(validate_for_insert(&draft).is_err(), "{bad} accepted");
        }
        let draft = ItemDraft {
            code: Some("x".repeat(20)),
            ..hammer()
        };
        assert_eq!(validate_for_insert(&draft).unwrap().code, "X".repeat(20));
    }

    #[test]
    fn test_name_and_description_lengths() {
        let short = ItemDraft {
            name: Some("Ha".into()),
            ..hammer()
        };
        assert!(validate_for_insert(&short).is_err());

        let long = ItemDraft {
            name: Some("H".repeat(201)),
            ..hammer()
        };
        assert!(validate_for_insert(&long).is_err());

        let description = ItemDraft {
            description: Some("d".repeat(1001)),
            ..hammer()
        };
        assert!(validate_for_insert(&description).is_err());

        let description = ItemDraft {
            description: Some("d".repeat(1000)),
            ..hammer()
        };
        assert!(validate_for_insert(&description).is_ok());
    }

    #[test]
    fn test_price_rules() {
        let equal = ItemDraft {
            sale_price: Some(Price::from_cents(1000)),
            ..hammer()
        };
        let errs = validate_for_insert(&equal).unwrap_err();
        assert_eq!(messages(&errs), vec!["salePrice must be greater than purchasePrice"]);

        let greedy = ItemDraft {
            sale_price: Some(Price::from_cents(11_001)),
            ..hammer()
        };
        assert!(validate_for_insert(&greedy).is_err());

        let exactly_ten = ItemDraft {
            sale_price: Some(Price::from_cents(11_000)),
            ..hammer()
        };
        assert!(validate_for_insert(&exactly_ten).is_ok());

        let free = ItemDraft {
            purchase_price: Some(Price::from_cents(0)),
            ..hammer()
        };
        assert!(validate_for_insert(&free).is_err());

        let huge = ItemDraft {
            sale_price: Some(Price::from_cents(100_000_000)),
            ..hammer()
        };
        assert!(validate_for_insert(&huge).is_err());
    }

    #[test]
    fn test_stock_rules() {
        let negative = ItemDraft {
            current_stock: Some(-1),
            ..hammer()
        };
        assert!(validate_for_insert(&negative).is_err());

        let too_high = ItemDraft {
            min_stock: Some(10_001),
            ..hammer()
        };
        assert!(validate_for_insert(&too_high).is_err());

        let limit = ItemDraft {
            min_stock: Some(10_000),
            ..hammer()
        };
        assert!(validate_for_insert(&limit).is_ok());

        let at_ceiling = ItemDraft {
            current_stock: Some(MAX_STOCK),
            ..hammer()
        };
        assert!(validate_for_insert(&at_ceiling).is_ok());

        let past_ceiling = ItemDraft {
            current_stock: Some(MAX_STOCK + 1),
            ..hammer()
        };
        let errs = validate_for_insert(&past_ceiling).unwrap_err();
        assert_eq!(
            messages(&errs),
            vec!["currentStock must be between 0 and 2147483647"]
        );
    }

    #[test]
    fn test_insert_always_creates_active_item() {
        let draft = ItemDraft {
            active: Some(false),
            ..hammer()
        };
        assert!(validate_for_insert(&draft).unwrap().active);

        // updates still carry the flag through
        let draft = ItemDraft {
            id: Some(1),
            active: Some(false),
            ..hammer()
        };
        assert!(!validate_for_update(&draft).unwrap().active);
    }

    #[test]
    fn test_update_requires_id_not_code() {
        let mut draft = hammer();
        draft.code = None;
        let errs = validate_for_update(&draft).unwrap_err();
        assert_eq!(messages(&errs), vec!["id is required"]);

        draft.id = Some(0);
        assert!(validate_for_update(&draft).is_err());

        draft.id = Some(3);
        let update = validate_for_update(&draft).unwrap();
        assert_eq!(update.id, 3);
    }

    #[test]
    fn test_update_ignores_bad_code() {
        let draft = ItemDraft {
            id: Some(1),
            code: Some("??".into()),
            ..hammer()
        };
        assert!(validate_for_update(&draft).is_ok());
    }

    #[test]
    fn test_search_helpers() {
        assert_eq!(validate_search_code(" ab ").unwrap(), "AB");
        assert!(validate_search_code("a").is_err());
        assert!(validate_search_code("  ").is_err());

        assert_eq!(validate_search_name(" ham ").unwrap(), "ham");
        assert!(validate_search_name("h").is_err());
    }

    #[test]
    fn test_scalar_helpers() {
        assert!(validate_id("id", 1).is_ok());
        assert!(validate_id("id", 0).is_err());
        assert!(validate_stock_level("newStock", 0).is_ok());
        assert!(validate_stock_level("newStock", -1).is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());

        assert!(validate_stock_level("newStock", MAX_STOCK).is_ok());
        assert!(validate_stock_level("newStock", MAX_STOCK + 1).is_err());
        assert!(validate_quantity(MAX_STOCK + 1).is_err());
        assert!(validate_delta(-MAX_STOCK).is_ok());
        assert!(validate_delta(i64::MIN).is_err());
        assert!(validate_delta(MAX_STOCK + 1).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every accepted draft satisfies the price invariants.
            #[test]
            fn accepted_prices_hold_invariants(
                purchase in 0i64..200_000_000,
                sale in 0i64..200_000_000,
            ) {
                let draft = ItemDraft {
                    purchase_price: Some(Price::from_cents(purchase)),
                    sale_price: Some(Price::from_cents(sale)),
                    ..hammer()
                };
                if let Ok(item) = validate_for_insert(&draft) {
                    prop_assert!(item.purchase_price.in_range());
                    prop_assert!(item.sale_price.in_range());
                    prop_assert!(item.sale_price > item.purchase_price);
                    prop_assert!(
                        (item.sale_price - item.purchase_price).cents() as i128
                            <= 10 * item.purchase_price.cents() as i128
                    );
                }
            }

            /// Property: valid codes survive normalization in any case.
            #[test]
            fn code_normalization_is_idempotent(code in "[a-zA-Z0-9]{4,20}") {
                let once = normalize_code(&code);
                prop_assert_eq!(normalize_code(&once), once.clone());

                let draft = ItemDraft { code: Some(format!("  {code} ")), ..hammer() };
                let item = validate_for_insert(&draft).unwrap();
                prop_assert_eq!(item.code, once);
            }
        }
    }
}
