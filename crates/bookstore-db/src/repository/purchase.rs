//! # Purchase Repository
//!
//! Supplier purchases: the header, one detail row per valid line, and the
//! stock increments, written in a single transaction.
//!
//! ```text
//! PurchaseInput ──validate()──► ValidPurchase (incomplete lines dropped)
//!                                     │
//!                     BEGIN ──────────┤
//!                       ├── supplier exists?
//!                       ├── every book exists?
//!                       ├── INSERT purchases (status = received)
//!                       ├── INSERT purchase_details × N
//!                       └── UPDATE books stock += qty (merged per book)
//!                     COMMIT
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::begin_write;
use super::book::{apply_stock_delta, require_in};
use crate::error::{DbError, DbResult};
use bookstore_core::input::PurchaseInput;
use bookstore_core::stock::plan_purchase_receipt;
use bookstore_core::{
    Purchase, PurchaseLineView, PurchaseStatus, PurchaseSummary, PurchaseWithLines,
};

const PURCHASE_COLUMNS: &str = "purchase_id, supplier_id, purchase_date, status, created_at";

/// Repository for supplier purchases.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Lists purchases, newest first, with supplier name, line count and
    /// total cost.
    pub async fn list(&self) -> DbResult<Vec<PurchaseSummary>> {
        let purchases = sqlx::query_as::<_, PurchaseSummary>(
            r#"
            SELECT
                p.purchase_id,
                p.supplier_id,
                s.name AS supplier_name,
                p.purchase_date,
                p.status,
                COUNT(d.purchase_detail_id) AS line_count,
                COALESCE(SUM(d.quantity * d.unit_cost_cents), 0) AS total_cost_cents
            FROM purchases p
            LEFT JOIN suppliers s ON s.supplier_id = p.supplier_id
            LEFT JOIN purchase_details d ON d.purchase_id = p.purchase_id
            GROUP BY p.purchase_id
            ORDER BY p.purchase_date DESC, p.purchase_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    /// Gets a purchase with its lines and book titles.
    pub async fn get(&self, purchase_id: i64) -> DbResult<PurchaseWithLines> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE purchase_id = ?1");
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(purchase_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", purchase_id))?;

        let supplier_name: Option<String> = match purchase.supplier_id {
            Some(supplier_id) => {
                sqlx::query_scalar("SELECT name FROM suppliers WHERE supplier_id = ?1")
                    .bind(supplier_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let lines = sqlx::query_as::<_, PurchaseLineView>(
            r#"
            SELECT d.purchase_detail_id, d.book_id, b.title AS book_title, d.quantity, d.unit_cost_cents
            FROM purchase_details d
            JOIN books b ON b.book_id = d.book_id
            WHERE d.purchase_id = ?1
            ORDER BY d.purchase_detail_id
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PurchaseWithLines {
            purchase,
            supplier_name,
            lines,
        })
    }

    /// Records a received purchase and adds its quantities to stock.
    ///
    /// Incomplete lines are dropped before anything is written.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(NoValidPurchaseLines))` - nothing left to record
    /// * `Err(DbError::NotFound)` - unknown supplier
    /// * `Err(DbError::Domain(BookNotFound))` - a line names an unknown book
    pub async fn create(&self, input: &PurchaseInput) -> DbResult<PurchaseWithLines> {
        let purchase = input.validate()?;
        let dropped = input.lines.len() - purchase.lines.len();
        debug!(
            supplier_id = purchase.supplier_id,
            lines = purchase.lines.len(),
            dropped,
            "Recording purchase"
        );

        let mut tx = begin_write(&self.pool).await?;

        let supplier_name: String =
            sqlx::query_scalar("SELECT name FROM suppliers WHERE supplier_id = ?1")
                .bind(purchase.supplier_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Supplier", purchase.supplier_id))?;

        let mut titles = Vec::with_capacity(purchase.lines.len());
        for line in &purchase.lines {
            titles.push(require_in(&mut tx, line.book_id).await?.title);
        }

        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO purchases (supplier_id, purchase_date, status, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {PURCHASE_COLUMNS}
            "#
        );
        let header = sqlx::query_as::<_, Purchase>(&sql)
            .bind(purchase.supplier_id)
            .bind(purchase.purchase_date.unwrap_or(now))
            .bind(PurchaseStatus::Received)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let mut lines = Vec::with_capacity(purchase.lines.len());
        for (line, title) in purchase.lines.iter().zip(titles) {
            let purchase_detail_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO purchase_details (purchase_id, book_id, quantity, unit_cost_cents)
                VALUES (?1, ?2, ?3, ?4)
                RETURNING purchase_detail_id
                "#,
            )
            .bind(header.purchase_id)
            .bind(line.book_id)
            .bind(line.quantity)
            .bind(line.unit_cost_cents)
            .fetch_one(&mut *tx)
            .await?;

            lines.push(PurchaseLineView {
                purchase_detail_id,
                book_id: line.book_id,
                book_title: title,
                quantity: line.quantity,
                unit_cost_cents: line.unit_cost_cents,
            });
        }

        for adjustment in plan_purchase_receipt(&purchase.lines)? {
            apply_stock_delta(&mut tx, adjustment).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            purchase_id = header.purchase_id,
            supplier_id = purchase.supplier_id,
            lines = lines.len(),
            "Purchase received"
        );

        Ok(PurchaseWithLines {
            purchase: header,
            supplier_name: Some(supplier_name),
            lines,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use crate::Database;
    use bookstore_core::input::{BookInput, PurchaseLineInput, SupplierInput};
    use bookstore_core::{CoreError, ValidationError};

    async fn setup(db: &Database) -> (i64, i64, i64) {
        let supplier = db
            .suppliers()
            .create(SupplierInput {
                name: "Fountain Publishers".to_string(),
                contact: String::new(),
                email: String::new(),
                address: String::new(),
            })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for (title, stock) in [("Dune", 2), ("Emma", 0)] {
            let book = db
                .books()
                .create(BookInput {
                    title: title.to_string(),
                    author_id: None,
                    category_id: None,
                    isbn: None,
                    stock_quantity: stock,
                    price_cents: 2500,
                })
                .await
                .unwrap();
            ids.push(book.book_id);
        }

        (supplier.supplier_id, ids[0], ids[1])
    }

    fn line(book_id: Option<i64>, quantity: i64, unit_cost_cents: i64) -> PurchaseLineInput {
        PurchaseLineInput {
            book_id,
            quantity,
            unit_cost_cents,
        }
    }

    #[tokio::test]
    async fn test_purchase_increments_stock_and_drops_invalid_lines() {
        let db = memory_db().await;
        let (supplier, dune, emma) = setup(&db).await;

        let input = PurchaseInput {
            supplier_id: Some(supplier),
            purchase_date: None,
            lines: vec![
                line(Some(dune), 10, 1200),
                line(None, 5, 1000),
                line(Some(emma), 0, 1000),
                line(Some(emma), 4, 1500),
                line(Some(emma), 3, 0),
            ],
        };

        let created = db.purchases().create(&input).await.unwrap();
        assert_eq!(created.lines.len(), 2);
        assert_eq!(created.purchase.status, PurchaseStatus::Received);
        assert_eq!(created.supplier_name.as_deref(), Some("Fountain Publishers"));

        assert_eq!(db.books().get(dune).await.unwrap().stock_quantity, 12);
        assert_eq!(db.books().get(emma).await.unwrap().stock_quantity, 4);

        let fetched = db.purchases().get(created.purchase.purchase_id).await.unwrap();
        assert_eq!(fetched.lines.len(), 2);
        assert_eq!(fetched.lines[0].book_title, "Dune");

        let list = db.purchases().list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].line_count, 2);
        assert_eq!(list[0].total_cost_cents, 10 * 1200 + 4 * 1500);
    }

    #[tokio::test]
    async fn test_repeated_book_lines_are_each_recorded() {
        let db = memory_db().await;
        let (supplier, dune, _) = setup(&db).await;

        let input = PurchaseInput {
            supplier_id: Some(supplier),
            purchase_date: None,
            lines: vec![line(Some(dune), 1, 100), line(Some(dune), 2, 100)],
        };
        let created = db.purchases().create(&input).await.unwrap();

        assert_eq!(created.lines.len(), 2);
        assert_eq!(db.books().get(dune).await.unwrap().stock_quantity, 5);
    }

    #[tokio::test]
    async fn test_purchase_without_valid_lines_is_rejected() {
        let db = memory_db().await;
        let (supplier, dune, _) = setup(&db).await;

        let input = PurchaseInput {
            supplier_id: Some(supplier),
            purchase_date: None,
            lines: vec![line(Some(dune), 0, 100), line(None, 1, 100)],
        };
        let err = db.purchases().create(&input).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NoValidPurchaseLines)));
        assert!(db.purchases().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_book_rolls_back_whole_purchase() {
        let db = memory_db().await;
        let (supplier, dune, _) = setup(&db).await;

        let input = PurchaseInput {
            supplier_id: Some(supplier),
            purchase_date: None,
            lines: vec![line(Some(dune), 5, 100), line(Some(9999), 1, 100)],
        };
        let err = db.purchases().create(&input).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::BookNotFound(9999))));

        assert_eq!(db.books().get(dune).await.unwrap().stock_quantity, 2);
        assert!(db.purchases().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_lines_are_rejected_before_writes() {
        let db = memory_db().await;
        let (supplier, dune, _) = setup(&db).await;

        let input = PurchaseInput {
            supplier_id: Some(supplier),
            purchase_date: None,
            lines: vec![line(Some(dune), i64::MAX, 1), line(Some(dune), 1, 1)],
        };
        let err = db.purchases().create(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { ref field, .. }))
            if field == "quantity"
        ));

        let input = PurchaseInput {
            supplier_id: Some(supplier),
            purchase_date: None,
            lines: vec![line(Some(dune), 1, i64::MAX)],
        };
        let err = db.purchases().create(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { ref field, .. }))
            if field == "price"
        ));

        assert_eq!(db.books().get(dune).await.unwrap().stock_quantity, 2);
        assert!(db.purchases().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_supplier_is_not_found() {
        let db = memory_db().await;
        let (_, dune, _) = setup(&db).await;

        let input = PurchaseInput {
            supplier_id: Some(404),
            purchase_date: None,
            lines: vec![line(Some(dune), 1, 100)],
        };
        let err = db.purchases().create(&input).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_supplier_with_purchases_cannot_be_deleted() {
        let db = memory_db().await;
        let (supplier, dune, _) = setup(&db).await;

        let input = PurchaseInput {
            supplier_id: Some(supplier),
            purchase_date: None,
            lines: vec![line(Some(dune), 1, 100)],
        };
        db.purchases().create(&input).await.unwrap();

        let err = db.suppliers().delete(supplier).await.unwrap_err();
        assert!(matches!(err, DbError::InUse { .. }));
    }
}
