//! # Dashboard Repository
//!
//! Headline counts for the dashboard tiles.

use sqlx::{FromRow, SqlitePool};

use crate::error::DbResult;
use bookstore_core::DashboardCounts;

#[derive(Debug, FromRow)]
struct CountsRow {
    books: i64,
    customers: i64,
    orders: i64,
    revenue_cents: i64,
}

/// Repository for dashboard counts.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    /// Creates a new DashboardRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Counts books, customers and orders, and sums order revenue, in one
    /// round trip.
    pub async fn counts(&self) -> DbResult<DashboardCounts> {
        let row = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS books,
                (SELECT COUNT(*) FROM customers) AS customers,
                (SELECT COUNT(*) FROM orders) AS orders,
                (SELECT COALESCE(SUM(total_amount_cents), 0) FROM orders) AS revenue_cents
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardCounts {
            books: row.books,
            customers: row.customers,
            orders: row.orders,
            revenue_cents: row.revenue_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use bookstore_core::input::{BookInput, OrderInput};
    use bookstore_core::PaymentMethod;

    #[tokio::test]
    async fn test_counts_empty_database() {
        let db = memory_db().await;
        assert_eq!(db.dashboard().counts().await.unwrap(), DashboardCounts::default());
    }

    #[tokio::test]
    async fn test_counts_after_an_order() {
        let db = memory_db().await;
        let book = db
            .books()
            .create(BookInput {
                title: "Kintu".to_string(),
                author_id: None,
                category_id: None,
                isbn: None,
                stock_quantity: 5,
                price_cents: 4000,
            })
            .await
            .unwrap();
        db.orders()
            .create(OrderInput {
                customer_name: "Jane".to_string(),
                customer_contact: None,
                customer_email: None,
                book_id: book.book_id,
                quantity: 2,
                unit_price_cents: None,
                payment_method: PaymentMethod::Card,
                order_date: None,
            })
            .await
            .unwrap();

        let counts = db.dashboard().counts().await.unwrap();
        assert_eq!(
            counts,
            DashboardCounts {
                books: 1,
                customers: 1,
                orders: 1,
                revenue_cents: 8000,
            }
        );
    }
}
