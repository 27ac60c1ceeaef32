//! # Customer Repository
//!
//! Database operations for customers, plus the find-or-create lookup used
//! by the order flow.
//!
//! ## Find-or-Create
//! ```text
//! Order for "jane doe"
//!      │
//!      ▼
//! SELECT ... WHERE name_key = 'jane doe' ORDER BY customer_id LIMIT 1
//!      │
//!      ├── found "Jane Doe" (id 4) → reuse id 4
//!      │
//!      └── none → INSERT "jane doe" → new id
//! ```
//! `name_key` is the trimmed name lowercased in Rust, so the match is
//! Unicode-aware ("ZOË" finds "Zoë"). Names are not unique; when several
//! customers share a name the oldest wins.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bookstore_core::input::CustomerInput;
use bookstore_core::Customer;

const COLUMNS: &str = "customer_id, name, contact, email, created_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists all customers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("SELECT {COLUMNS} FROM customers ORDER BY name COLLATE NOCASE, customer_id");
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Gets a customer by id.
    pub async fn get(&self, customer_id: i64) -> DbResult<Customer> {
        let sql = format!("SELECT {COLUMNS} FROM customers WHERE customer_id = ?1");
        sqlx::query_as::<_, Customer>(&sql)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", customer_id))
    }

    /// Inserts a new customer.
    pub async fn create(&self, input: CustomerInput) -> DbResult<Customer> {
        let input = input.validate()?;
        let mut conn = self.pool.acquire().await?;
        insert_in(&mut conn, &input).await
    }

    /// Overwrites a customer's editable fields.
    pub async fn update(&self, customer_id: i64, input: CustomerInput) -> DbResult<Customer> {
        let input = input.validate()?;
        debug!(customer_id, "Updating customer");

        let sql = format!(
            "UPDATE customers SET name = ?2, contact = ?3, email = ?4, name_key = ?5 WHERE customer_id = ?1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(customer_id)
            .bind(&input.name)
            .bind(&input.contact)
            .bind(&input.email)
            .bind(name_key(&input.name))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", customer_id))
    }

    /// Deletes a customer.
    ///
    /// ## Returns
    /// * `Err(DbError::InUse)` - "Cannot delete customer: they have associated orders"
    pub async fn delete(&self, customer_id: i64) -> DbResult<()> {
        debug!(customer_id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE customer_id = ?1")
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).on_delete("customer", "they have associated orders"))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", customer_id));
        }

        Ok(())
    }

    /// Resolves a customer by name, creating one if none matches.
    pub async fn find_or_create(&self, input: CustomerInput) -> DbResult<Customer> {
        let input = input.validate()?;
        let mut conn = self.pool.acquire().await?;
        find_or_create_in(&mut conn, &input).await
    }

    /// Counts customers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Lookup key for a customer name: trimmed and Unicode-lowercased.
pub(crate) fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Fills `name_key` for rows written before the column existed.
///
/// Returns the number of rows updated.
pub(crate) async fn backfill_name_keys(pool: &SqlitePool) -> DbResult<u64> {
    let rows: Vec<(i64, String)> =
        sqlx::query_as("SELECT customer_id, name FROM customers WHERE name_key = ''")
            .fetch_all(pool)
            .await?;

    let mut filled = 0;
    for (customer_id, name) in rows {
        filled += sqlx::query("UPDATE customers SET name_key = ?2 WHERE customer_id = ?1")
            .bind(customer_id)
            .bind(name_key(&name))
            .execute(pool)
            .await?
            .rows_affected();
    }

    Ok(filled)
}

/// Inserts a customer on the given connection. `input` must be validated.
pub(crate) async fn insert_in(
    conn: &mut SqliteConnection,
    input: &CustomerInput,
) -> DbResult<Customer> {
    debug!(name = %input.name, "Inserting customer");

    let sql = format!(
        "INSERT INTO customers (name, contact, email, created_at, name_key) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {COLUMNS}"
    );
    let customer = sqlx::query_as::<_, Customer>(&sql)
        .bind(&input.name)
        .bind(&input.contact)
        .bind(&input.email)
        .bind(Utc::now())
        .bind(name_key(&input.name))
        .fetch_one(&mut *conn)
        .await?;

    Ok(customer)
}

/// Case-insensitive name lookup; inserts a new customer when nothing matches.
/// `input` must be validated.
pub(crate) async fn find_or_create_in(
    conn: &mut SqliteConnection,
    input: &CustomerInput,
) -> DbResult<Customer> {
    let sql = format!(
        "SELECT {COLUMNS} FROM customers WHERE name_key = ?1 ORDER BY customer_id LIMIT 1"
    );
    let existing = sqlx::query_as::<_, Customer>(&sql)
        .bind(name_key(&input.name))
        .fetch_optional(&mut *conn)
        .await?;

    match existing {
        Some(customer) => {
            debug!(customer_id = customer.customer_id, "Reusing existing customer");
            Ok(customer)
        }
        None => insert_in(conn, input).await,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;

    fn customer(name: &str) -> CustomerInput {
        CustomerInput {
            name: name.to_string(),
            contact: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn test_find_or_create_reuses_case_insensitive_match() {
        let db = memory_db().await;
        let repo = db.customers();

        let jane = repo.create(customer("Jane Doe")).await.unwrap();
        let again = repo.find_or_create(customer("  jane DOE ")).await.unwrap();
        assert_eq!(again.customer_id, jane.customer_id);
        assert_eq!(repo.count().await.unwrap(), 1);

        let john = repo.find_or_create(customer("John Doe")).await.unwrap();
        assert_ne!(john.customer_id, jane.customer_id);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_or_create_folds_non_ascii_case() {
        let db = memory_db().await;
        let repo = db.customers();

        let zoe = repo.create(customer("Zoë Ångström")).await.unwrap();
        let again = repo.find_or_create(customer("ZOË ÅNGSTRÖM")).await.unwrap();
        assert_eq!(again.customer_id, zoe.customer_id);
        assert_eq!(again.name, "Zoë Ångström");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_renamed_customer_is_found_by_new_name() {
        let db = memory_db().await;
        let repo = db.customers();

        let c = repo.create(customer("Émile")).await.unwrap();
        repo.update(c.customer_id, customer("Öskar")).await.unwrap();

        let found = repo.find_or_create(customer("öSKAR")).await.unwrap();
        assert_eq!(found.customer_id, c.customer_id);
        let fresh = repo.find_or_create(customer("émile")).await.unwrap();
        assert_ne!(fresh.customer_id, c.customer_id);
    }

    #[tokio::test]
    async fn test_backfill_fills_missing_name_keys() {
        let db = memory_db().await;
        sqlx::query("INSERT INTO customers (name, created_at) VALUES ('Ørjan', ?1)")
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(backfill_name_keys(db.pool()).await.unwrap(), 1);
        assert_eq!(backfill_name_keys(db.pool()).await.unwrap(), 0);

        let found = db.customers().find_or_create(customer("ØRJAN")).await.unwrap();
        assert_eq!(found.name, "Ørjan");
        assert_eq!(db.customers().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_or_create_picks_oldest_duplicate() {
        let db = memory_db().await;
        let repo = db.customers();

        let first = repo.create(customer("Sam")).await.unwrap();
        repo.create(customer("SAM")).await.unwrap();

        let found = repo.find_or_create(customer("sam")).await.unwrap();
        assert_eq!(found.customer_id, first.customer_id);
    }

    #[tokio::test]
    async fn test_customer_update_and_delete() {
        let db = memory_db().await;
        let repo = db.customers();

        let c = repo.create(customer("Amina")).await.unwrap();
        let updated = repo
            .update(
                c.customer_id,
                CustomerInput {
                    name: "Amina K".to_string(),
                    contact: Some("0700 000000".to_string()),
                    email: Some("amina@example.com".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email.as_deref(), Some("amina@example.com"));

        repo.delete(c.customer_id).await.unwrap();
        assert!(matches!(repo.get(c.customer_id).await, Err(DbError::NotFound { .. })));
    }
}
