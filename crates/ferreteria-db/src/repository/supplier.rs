//! # Supplier Repository
//!
//! Read access to suppliers, plus inserts for seeding.

use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use ferreteria_core::Supplier;

const SUPPLIER_COLUMNS: &str = "id, name, contact, phone, email, address";

/// Supplier fields before an id is assigned.
#[derive(Debug, Clone, Default)]
pub struct NewSupplier {
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// All suppliers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = ?1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already present
    pub async fn insert(&self, supplier: &NewSupplier) -> DbResult<Supplier> {
        let sql = format!(
            "INSERT INTO suppliers (name, contact, phone, email, address) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {SUPPLIER_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, Supplier>(&sql)
            .bind(&supplier.name)
            .bind(&supplier.contact)
            .bind(&supplier.phone)
            .bind(&supplier.email)
            .bind(&supplier.address)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, supplier.name.clone()),
                other => other,
            })?;
        Ok(stored)
    }
}
