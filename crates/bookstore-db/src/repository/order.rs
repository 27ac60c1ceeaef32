//! # Order Repository
//!
//! The order flow: customer resolution, header and detail writes, and stock
//! reconciliation, each run as one SQLite transaction.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE  (one transaction)                                          │
//! │     ├── read book stock                                                │
//! │     ├── plan_order_create() → reject if qty > stock (nothing written)  │
//! │     ├── find_or_create customer                                        │
//! │     ├── INSERT orders, INSERT order_details                            │
//! │     └── UPDATE books stock (guarded)                                   │
//! │                                                                         │
//! │  2. EDIT  (one transaction)                                            │
//! │     ├── read existing header + detail, read new book stock             │
//! │     ├── plan_order_edit() → same book: Δ = old - new                   │
//! │     │                       new book:  +old on old, -new on new        │
//! │     ├── find_or_create customer                                        │
//! │     ├── UPDATE orders, UPDATE order_details                            │
//! │     └── UPDATE books stock (guarded)                                   │
//! │                                                                         │
//! │  3. DELETE  (one transaction)                                          │
//! │     ├── UPDATE books stock (+qty)                                      │
//! │     ├── DELETE order_details                                           │
//! │     └── DELETE orders                                                  │
//! │                                                                         │
//! │  Any error → transaction dropped → rolled back, nothing applied        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::book::{apply_stock_delta, require_in};
use super::customer::find_or_create_in;
use super::begin_write;
use crate::error::{DbError, DbResult};
use bookstore_core::input::OrderInput;
use bookstore_core::stock::{plan_order_create, plan_order_delete, plan_order_edit, OrderLine};
use bookstore_core::validation::line_total;
use bookstore_core::{Customer, Order, OrderDetail, OrderSummary, OrderWithDetail};

const ORDER_COLUMNS: &str = "order_id, customer_id, order_date, payment_method, total_amount_cents";
const DETAIL_COLUMNS: &str = "order_detail_id, order_id, book_id, quantity, price_cents, created_at";

/// Repository for the order flow.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Lists orders, newest first, with customer and book.
    pub async fn list(&self) -> DbResult<Vec<OrderSummary>> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r#"
            SELECT
                o.order_id,
                o.order_date,
                o.payment_method,
                o.total_amount_cents,
                o.customer_id,
                c.name AS customer_name,
                c.contact AS customer_contact,
                c.email AS customer_email,
                d.book_id,
                b.title AS book_title,
                d.quantity,
                d.price_cents AS unit_price_cents
            FROM orders o
            JOIN customers c ON c.customer_id = o.customer_id
            LEFT JOIN order_details d ON d.order_id = o.order_id
            LEFT JOIN books b ON b.book_id = d.book_id
            ORDER BY o.order_date DESC, o.order_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Gets an order with its detail line and customer.
    pub async fn get(&self, order_id: i64) -> DbResult<OrderWithDetail> {
        let mut conn = self.pool.acquire().await?;
        let (order, detail) = require_order_in(&mut conn, order_id).await?;
        let customer = customer_in(&mut conn, order.customer_id).await?;

        Ok(OrderWithDetail {
            order,
            detail,
            customer,
        })
    }

    /// Creates an order and takes its copies off the shelf.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(InsufficientStock))` - quantity exceeds stock;
    ///   no customer, order or stock change is written
    /// * `Err(DbError::Domain(BookNotFound))` - unknown book
    pub async fn create(&self, input: OrderInput) -> DbResult<OrderWithDetail> {
        let input = input.validate()?;
        debug!(book_id = input.book_id, quantity = input.quantity, "Creating order");

        let mut tx = begin_write(&self.pool).await?;

        let book = require_in(&mut tx, input.book_id).await?;
        let plan = plan_order_create(
            OrderLine::new(book.book_id, input.quantity),
            book.stock_quantity,
        )
        .map_err(|shortfall| shortfall.for_title(&book.title))?;

        let customer = find_or_create_in(&mut tx, &input.customer()).await?;

        let unit_price = input.unit_price_cents.unwrap_or(book.price_cents);
        let total = line_total(unit_price, input.quantity)?;
        let order_date = input.order_date.unwrap_or_else(Utc::now);

        let sql = format!(
            r#"
            INSERT INTO orders (customer_id, order_date, payment_method, total_amount_cents)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(customer.customer_id)
            .bind(order_date)
            .bind(input.payment_method)
            .bind(total.cents())
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            r#"
            INSERT INTO order_details (order_id, book_id, quantity, price_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING {DETAIL_COLUMNS}
            "#
        );
        let detail = sqlx::query_as::<_, OrderDetail>(&sql)
            .bind(order.order_id)
            .bind(book.book_id)
            .bind(input.quantity)
            .bind(unit_price)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        for adjustment in plan {
            apply_stock_delta(&mut tx, adjustment).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = order.order_id,
            customer_id = customer.customer_id,
            total = %total,
            "Order created"
        );

        Ok(OrderWithDetail {
            order,
            detail,
            customer,
        })
    }

    /// Rewrites an order and reconciles stock against the previous version.
    ///
    /// When the unit price is omitted the existing price is kept for the same
    /// book, and the new book's list price is used after a book change.
    pub async fn update(&self, order_id: i64, input: OrderInput) -> DbResult<OrderWithDetail> {
        let input = input.validate()?;
        debug!(order_id, "Updating order");

        let mut tx = begin_write(&self.pool).await?;

        let (existing, old_detail) = require_order_in(&mut tx, order_id).await?;
        let new_book = require_in(&mut tx, input.book_id).await?;

        let plan = plan_order_edit(
            OrderLine::new(old_detail.book_id, old_detail.quantity),
            OrderLine::new(new_book.book_id, input.quantity),
            new_book.stock_quantity,
        )
        .map_err(|shortfall| shortfall.for_title(&new_book.title))?;

        let customer = find_or_create_in(&mut tx, &input.customer()).await?;

        let unit_price = input.unit_price_cents.unwrap_or(if new_book.book_id == old_detail.book_id {
            old_detail.price_cents
        } else {
            new_book.price_cents
        });
        let total = line_total(unit_price, input.quantity)?;
        let order_date = input.order_date.unwrap_or(existing.order_date);

        let sql = format!(
            r#"
            UPDATE orders SET
                customer_id = ?2,
                order_date = ?3,
                payment_method = ?4,
                total_amount_cents = ?5
            WHERE order_id = ?1
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .bind(customer.customer_id)
            .bind(order_date)
            .bind(input.payment_method)
            .bind(total.cents())
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            r#"
            UPDATE order_details SET
                book_id = ?2,
                quantity = ?3,
                price_cents = ?4
            WHERE order_detail_id = ?1
            RETURNING {DETAIL_COLUMNS}
            "#
        );
        let detail = sqlx::query_as::<_, OrderDetail>(&sql)
            .bind(old_detail.order_detail_id)
            .bind(new_book.book_id)
            .bind(input.quantity)
            .bind(unit_price)
            .fetch_one(&mut *tx)
            .await?;

        for adjustment in plan {
            apply_stock_delta(&mut tx, adjustment).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id, total = %total, "Order updated");

        Ok(OrderWithDetail {
            order,
            detail,
            customer,
        })
    }

    /// Deletes an order and puts its copies back on the shelf.
    pub async fn delete(&self, order_id: i64) -> DbResult<()> {
        debug!(order_id, "Deleting order");

        let mut tx = begin_write(&self.pool).await?;

        let (_, detail) = require_order_in(&mut tx, order_id).await?;

        for adjustment in plan_order_delete(OrderLine::new(detail.book_id, detail.quantity)) {
            apply_stock_delta(&mut tx, adjustment).await?;
        }

        sqlx::query("DELETE FROM order_details WHERE order_detail_id = ?1")
            .bind(detail.order_detail_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM orders WHERE order_id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id, restored = detail.quantity, "Order deleted");
        Ok(())
    }

    /// Counts orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Reads an order header and its single detail line.
async fn require_order_in(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> DbResult<(Order, OrderDetail)> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?1");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

    let sql = format!(
        "SELECT {DETAIL_COLUMNS} FROM order_details WHERE order_id = ?1 ORDER BY order_detail_id LIMIT 1"
    );
    let detail = sqlx::query_as::<_, OrderDetail>(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Order detail", order_id))?;

    Ok((order, detail))
}

async fn customer_in(conn: &mut SqliteConnection, customer_id: i64) -> DbResult<Customer> {
    sqlx::query_as::<_, Customer>(
        "SELECT customer_id, name, contact, email, created_at FROM customers WHERE customer_id = ?1",
    )
    .bind(customer_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Customer", customer_id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use crate::{Database, DbConfig};
    use bookstore_core::input::BookInput;
    use bookstore_core::{CoreError, PaymentMethod, ValidationError};

    async fn book_with_stock(db: &Database, title: &str, stock: i64) -> i64 {
        db.books()
            .create(BookInput {
                title: title.to_string(),
                author_id: None,
                category_id: None,
                isbn: None,
                stock_quantity: stock,
                price_cents: 2500,
            })
            .await
            .unwrap()
            .book_id
    }

    async fn stock_of(db: &Database, book_id: i64) -> i64 {
        db.books().get(book_id).await.unwrap().stock_quantity
    }

    fn order(customer: &str, book_id: i64, quantity: i64) -> OrderInput {
        OrderInput {
            customer_name: customer.to_string(),
            customer_contact: None,
            customer_email: None,
            book_id,
            quantity,
            unit_price_cents: None,
            payment_method: PaymentMethod::Cash,
            order_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_decreases_stock_by_quantity() {
        let db = memory_db().await;
        let book = book_with_stock(&db, "Dune", 10).await;

        let created = db.orders().create(order("Jane", book, 3)).await.unwrap();

        assert_eq!(stock_of(&db, book).await, 7);
        assert_eq!(created.detail.quantity, 3);
        assert_eq!(created.detail.price_cents, 2500);
        assert_eq!(created.order.total_amount_cents, 7500);
    }

    #[tokio::test]
    async fn test_create_over_stock_writes_nothing() {
        let db = memory_db().await;
        let book = book_with_stock(&db, "Dune", 2).await;

        let err = db.orders().create(order("Newcomer", book, 3)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));

        assert_eq!(stock_of(&db, book).await, 2);
        assert_eq!(db.orders().count().await.unwrap(), 0);
        assert_eq!(db.customers().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversized_unit_price_is_rejected_without_writes() {
        let db = memory_db().await;
        let book = book_with_stock(&db, "Dune", 10).await;

        let mut input = order("Jane", book, 3);
        input.unit_price_cents = Some(i64::MAX / 2);
        let err = db.orders().create(input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { ref field, .. }))
            if field == "price"
        ));
        assert_eq!(stock_of(&db, book).await, 10);
        assert_eq!(db.orders().count().await.unwrap(), 0);

        // Same guard on edit; the stored order is untouched.
        let created = db.orders().create(order("Jane", book, 1)).await.unwrap();
        let mut edit = order("Jane", book, 3);
        edit.unit_price_cents = Some(i64::MAX / 2);
        let err = db.orders().update(created.order.order_id, edit).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        let stored = db.orders().get(created.order.order_id).await.unwrap();
        assert_eq!(stored.detail.quantity, 1);
        assert_eq!(stock_of(&db, book).await, 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_orders_on_one_book_all_commit() {
        let path = std::env::temp_dir().join(format!(
            "bookstore-orders-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();
        let book = book_with_stock(&db, "Dune", 20).await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move {
                    db.orders().create(order(&format!("Reader {i}"), book, 2)).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(stock_of(&db, book).await, 4);
        assert_eq!(db.orders().count().await.unwrap(), 8);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }

    #[tokio::test]
    async fn test_create_uses_explicit_unit_price() {
        let db = memory_db().await;
        let book = book_with_stock(&db, "Dune", 5).await;

        let mut input = order("Jane", book, 2);
        input.unit_price_cents = Some(2000);
        let created = db.orders().create(input).await.unwrap();

        assert_eq!(created.detail.price_cents, 2000);
        assert_eq!(created.order.total_amount_cents, 4000);
    }

    #[tokio::test]
    async fn test_edit_same_book_applies_difference() {
        let db = memory_db().await;
        let book = book_with_stock(&db, "Dune", 10).await;
        let created = db.orders().create(order("Jane", book, 3)).await.unwrap();
        assert_eq!(stock_of(&db, book).await, 7);

        db.orders()
            .update(created.order.order_id, order("Jane", book, 5))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, book).await, 5);

        db.orders()
            .update(created.order.order_id, order("Jane", book, 1))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, book).await, 9);
    }

    #[tokio::test]
    async fn test_edit_same_book_counts_own_copies_as_available() {
        let db = memory_db().await;
        let book = book_with_stock(&db, "Dune", 4).await;
        let created = db.orders().create(order("Jane", book, 3)).await.unwrap();
        assert_eq!(stock_of(&db, book).await, 1);

        // 1 on the shelf + 3 on the order = 4 available
        db.orders()
            .update(created.order.order_id, order("Jane", book, 4))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, book).await, 0);

        let err = db
            .orders()
            .update(created.order.order_id, order("Jane", book, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
        assert_eq!(stock_of(&db, book).await, 0);
    }

    #[tokio::test]
    async fn test_edit_to_other_book_moves_stock() {
        let db = memory_db().await;
        let dune = book_with_stock(&db, "Dune", 10).await;
        let emma = book_with_stock(&db, "Emma", 6).await;

        let created = db.orders().create(order("Jane", dune, 3)).await.unwrap();
        assert_eq!(stock_of(&db, dune).await, 7);

        let updated = db
            .orders()
            .update(created.order.order_id, order("Jane", emma, 4))
            .await
            .unwrap();

        assert_eq!(stock_of(&db, dune).await, 10);
        assert_eq!(stock_of(&db, emma).await, 2);
        assert_eq!(updated.detail.book_id, emma);
        assert_eq!(updated.detail.order_detail_id, created.detail.order_detail_id);
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_everything_unchanged() {
        let db = memory_db().await;
        let dune = book_with_stock(&db, "Dune", 10).await;
        let emma = book_with_stock(&db, "Emma", 1).await;
        let created = db.orders().create(order("Jane", dune, 3)).await.unwrap();

        let err = db
            .orders()
            .update(created.order.order_id, order("Someone New", emma, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

        assert_eq!(stock_of(&db, dune).await, 7);
        assert_eq!(stock_of(&db, emma).await, 1);
        assert_eq!(db.customers().count().await.unwrap(), 1);

        let still = db.orders().get(created.order.order_id).await.unwrap();
        assert_eq!(still.detail.book_id, dune);
        assert_eq!(still.detail.quantity, 3);
    }

    #[tokio::test]
    async fn test_delete_restores_stock() {
        let db = memory_db().await;
        let book = book_with_stock(&db, "Dune", 10).await;
        let created = db.orders().create(order("Jane", book, 4)).await.unwrap();
        assert_eq!(stock_of(&db, book).await, 6);

        db.orders().delete(created.order.order_id).await.unwrap();

        assert_eq!(stock_of(&db, book).await, 10);
        assert_eq!(db.orders().count().await.unwrap(), 0);
        assert!(matches!(
            db.orders().get(created.order.order_id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_orders_reuse_customer_by_name() {
        let db = memory_db().await;
        let book = book_with_stock(&db, "Dune", 10).await;

        let a = db.orders().create(order("Jane Doe", book, 1)).await.unwrap();
        let b = db.orders().create(order("JANE DOE", book, 1)).await.unwrap();
        let c = db.orders().create(order("John Doe", book, 1)).await.unwrap();

        assert_eq!(a.customer.customer_id, b.customer.customer_id);
        assert_ne!(a.customer.customer_id, c.customer.customer_id);
        assert_eq!(db.customers().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_customer_with_orders_cannot_be_deleted() {
        let db = memory_db().await;
        let book = book_with_stock(&db, "Dune", 10).await;
        let created = db.orders().create(order("Jane", book, 1)).await.unwrap();

        let err = db
            .customers()
            .delete(created.customer.customer_id)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot delete customer: they have associated orders"
        );
    }

    #[tokio::test]
    async fn test_list_orders_joins_customer_and_book() {
        let db = memory_db().await;
        let book = book_with_stock(&db, "Dune", 10).await;
        db.orders().create(order("Jane", book, 2)).await.unwrap();

        let list = db.orders().list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].customer_name, "Jane");
        assert_eq!(list[0].book_title.as_deref(), Some("Dune"));
        assert_eq!(list[0].quantity, Some(2));
    }
}
