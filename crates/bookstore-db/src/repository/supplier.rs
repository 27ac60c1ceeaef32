//! # Supplier Repository
//!
//! Database operations for suppliers.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bookstore_core::input::SupplierInput;
use bookstore_core::Supplier;

const COLUMNS: &str = "supplier_id, name, contact, email, address";

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists all suppliers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("SELECT {COLUMNS} FROM suppliers ORDER BY name COLLATE NOCASE, supplier_id");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    /// Gets a supplier by id.
    pub async fn get(&self, supplier_id: i64) -> DbResult<Supplier> {
        let sql = format!("SELECT {COLUMNS} FROM suppliers WHERE supplier_id = ?1");
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(supplier_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", supplier_id))
    }

    /// Inserts a new supplier.
    pub async fn create(&self, input: SupplierInput) -> DbResult<Supplier> {
        let input = input.validate()?;
        debug!(name = %input.name, "Inserting supplier");

        let sql = format!(
            "INSERT INTO suppliers (name, contact, email, address) VALUES (?1, ?2, ?3, ?4) RETURNING {COLUMNS}"
        );
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(&input.name)
            .bind(&input.contact)
            .bind(&input.email)
            .bind(&input.address)
            .fetch_one(&self.pool)
            .await?;

        Ok(supplier)
    }

    /// Overwrites a supplier's editable fields.
    pub async fn update(&self, supplier_id: i64, input: SupplierInput) -> DbResult<Supplier> {
        let input = input.validate()?;
        debug!(supplier_id, "Updating supplier");

        let sql = format!(
            r#"
            UPDATE suppliers SET name = ?2, contact = ?3, email = ?4, address = ?5
            WHERE supplier_id = ?1
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(supplier_id)
            .bind(&input.name)
            .bind(&input.contact)
            .bind(&input.email)
            .bind(&input.address)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", supplier_id))
    }

    /// Deletes a supplier.
    ///
    /// ## Returns
    /// * `Err(DbError::InUse)` - purchases reference this supplier
    pub async fn delete(&self, supplier_id: i64) -> DbResult<()> {
        debug!(supplier_id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE supplier_id = ?1")
            .bind(supplier_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).on_delete("supplier", "it has recorded purchases"))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", supplier_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
