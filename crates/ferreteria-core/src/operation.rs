//! # Operation Catalog
//!
//! Every operation the facade accepts, with the minimum role required and
//! the argument names it reads. Parsing is by exact (camelCase) name; any
//! other name is unknown and therefore denied.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::types::Role;

/// A facade operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    InsertItem,
    UpdateItem,
    RetireItem,
    SetStock,
    AdjustStock,
    RegisterEntry,
    RegisterExit,
    GetByCode,
    GetById,
    SearchByName,
    ListAll,
    ListCategories,
    ListSuppliers,
    ListLowStock,
    ListMovements,
    HealthCheck,
    ChangePassword,
}

impl Operation {
    /// All operations, in catalog order.
    pub const ALL: [Operation; 17] = [
        Operation::InsertItem,
        Operation::UpdateItem,
        Operation::RetireItem,
        Operation::SetStock,
        Operation::AdjustStock,
        Operation::RegisterEntry,
        Operation::RegisterExit,
        Operation::GetByCode,
        Operation::GetById,
        Operation::SearchByName,
        Operation::ListAll,
        Operation::ListCategories,
        Operation::ListSuppliers,
        Operation::ListLowStock,
        Operation::ListMovements,
        Operation::HealthCheck,
        Operation::ChangePassword,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::InsertItem => "insertItem",
            Operation::UpdateItem => "updateItem",
            Operation::RetireItem => "retireItem",
            Operation::SetStock => "setStock",
            Operation::AdjustStock => "adjustStock",
            Operation::RegisterEntry => "registerEntry",
            Operation::RegisterExit => "registerExit",
            Operation::GetByCode => "getByCode",
            Operation::GetById => "getById",
            Operation::SearchByName => "searchByName",
            Operation::ListAll => "listAll",
            Operation::ListCategories => "listCategories",
            Operation::ListSuppliers => "listSuppliers",
            Operation::ListLowStock => "listLowStock",
            Operation::ListMovements => "listMovements",
            Operation::HealthCheck => "healthCheck",
            Operation::ChangePassword => "changePassword",
        }
    }

    /// Minimum role allowed to invoke this operation.
    ///
    /// ```text
    /// ADMIN     insertItem updateItem retireItem
    /// OPERATOR  setStock adjustStock registerEntry registerExit
    /// READONLY  every read, healthCheck, changePassword (own account)
    /// ```
    pub fn required_role(&self) -> Role {
        match self {
            Operation::InsertItem | Operation::UpdateItem | Operation::RetireItem => Role::Admin,

            Operation::SetStock
            | Operation::AdjustStock
            | Operation::RegisterEntry
            | Operation::RegisterExit => Role::Operator,

            Operation::GetByCode
            | Operation::GetById
            | Operation::SearchByName
            | Operation::ListAll
            | Operation::ListCategories
            | Operation::ListSuppliers
            | Operation::ListLowStock
            | Operation::ListMovements
            | Operation::HealthCheck
            | Operation::ChangePassword => Role::ReadOnly,
        }
    }

    /// True for operations that never write.
    pub fn is_read(&self) -> bool {
        self.required_role() == Role::ReadOnly && *self != Operation::ChangePassword
    }

    /// Argument names read from the request map.
    pub fn args(&self) -> &'static [&'static str] {
        const ITEM_FIELDS: &[&str] = &[
            "code",
            "name",
            "description",
            "categoryId",
            "supplierId",
            "purchasePrice",
            "salePrice",
            "currentStock",
            "minStock",
        ];
        const UPDATE_FIELDS: &[&str] = &[
            "id",
            "name",
            "description",
            "categoryId",
            "supplierId",
            "purchasePrice",
            "salePrice",
            "currentStock",
            "minStock",
            "active",
            "reason",
        ];

        match self {
            Operation::InsertItem => ITEM_FIELDS,
            Operation::UpdateItem => UPDATE_FIELDS,
            Operation::RetireItem | Operation::GetById => &["id"],
            Operation::SetStock => &["id", "newStock", "reason"],
            Operation::AdjustStock => &["id", "delta", "reason"],
            Operation::RegisterEntry | Operation::RegisterExit => &["id", "quantity", "reason"],
            Operation::GetByCode => &["code"],
            Operation::SearchByName => &["name"],
            Operation::ListMovements => &["itemId"],
            Operation::ChangePassword => &["currentPassword", "newPassword"],
            Operation::ListAll
            | Operation::ListCategories
            | Operation::ListSuppliers
            | Operation::ListLowStock
            | Operation::HealthCheck => &[],
        }
    }

    /// Catalog entry for discovery.
    pub fn describe(&self) -> OperationInfo {
        OperationInfo {
            name: self.name(),
            required_role: self.required_role(),
            args: self.args(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned for names outside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

/// One row of the public operation catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
    pub name: &'static str,
    pub required_role: Role,
    pub args: &'static [&'static str],
}
