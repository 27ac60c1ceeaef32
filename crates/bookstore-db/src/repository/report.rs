//! # Report Repository
//!
//! Fetches the source rows for the reporting dashboard. The date window is
//! applied in SQL; the reduction into datasets happens in
//! [`bookstore_core::report::build_report`].
//!
//! ```text
//! ┌────────────────────┐   since    ┌──────────────────┐
//! │ order lines        │ ─────────► │                  │
//! │ + book/author/cat  │            │                  │
//! ├────────────────────┤            │   ReportData     │ ──► build_report()
//! │ books + units sold │ (all time) │                  │
//! ├────────────────────┤            │                  │
//! │ customer orders    │ ─────────► │                  │
//! └────────────────────┘   since    └──────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use bookstore_core::report::{
    build_report, BookStock, CustomerOrder, DateRange, Report, ReportData, ReportOptions,
    ReportType, SaleLine,
};

/// Repository for report source queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Fetches every source row needed for a report.
    ///
    /// `since = None` means all time.
    pub async fn fetch(&self, since: Option<DateTime<Utc>>) -> DbResult<ReportData> {
        let sales = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT
                o.order_id,
                o.order_date,
                o.customer_id,
                d.book_id,
                b.title AS book_title,
                a.name AS author_name,
                c.name AS category_name,
                d.quantity,
                d.price_cents
            FROM order_details d
            JOIN orders o ON o.order_id = d.order_id
            JOIN books b ON b.book_id = d.book_id
            LEFT JOIN authors a ON a.author_id = b.author_id
            LEFT JOIN categories c ON c.category_id = b.category_id
            WHERE (?1 IS NULL OR o.order_date >= ?1)
            ORDER BY o.order_date
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let books = sqlx::query_as::<_, BookStock>(
            r#"
            SELECT
                b.book_id,
                b.title,
                a.name AS author_name,
                c.name AS category_name,
                b.stock_quantity,
                COALESCE(SUM(d.quantity), 0) AS units_sold
            FROM books b
            LEFT JOIN authors a ON a.author_id = b.author_id
            LEFT JOIN categories c ON c.category_id = b.category_id
            LEFT JOIN order_details d ON d.book_id = b.book_id
            GROUP BY b.book_id
            ORDER BY b.title COLLATE NOCASE, b.book_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let customer_orders = sqlx::query_as::<_, CustomerOrder>(
            r#"
            SELECT
                cu.customer_id,
                cu.name AS customer_name,
                cu.email AS customer_email,
                o.order_id,
                o.order_date,
                o.total_amount_cents
            FROM orders o
            JOIN customers cu ON cu.customer_id = o.customer_id
            WHERE (?1 IS NULL OR o.order_date >= ?1)
            ORDER BY o.order_date
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        debug!(
            sales = sales.len(),
            books = books.len(),
            customer_orders = customer_orders.len(),
            "Report source rows fetched"
        );

        Ok(ReportData {
            sales,
            books,
            customer_orders,
        })
    }

    /// Fetches source rows for `range` and reduces them into a report.
    pub async fn build(
        &self,
        range: DateRange,
        report_type: ReportType,
        now: DateTime<Utc>,
        options: &ReportOptions,
    ) -> DbResult<Report> {
        let data = self.fetch(range.since(now)).await?;
        Ok(build_report(range, report_type, now, &data, options))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
