//! # Book Repository
//!
//! Database operations for books.
//!
//! ## Key Operations
//! - Listing with author and category names embedded
//! - Search by title substring, category and author
//! - CRUD operations
//! - Guarded stock adjustments used by the order and purchase flows
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ Read-modify-write (two requests can both see stock = 5)        │
//! │     stock = read(); UPDATE books SET stock_quantity = stock - 3    │
//! │                                                                     │
//! │  ✅ Guarded delta (one statement, checked by SQLite)               │
//! │     UPDATE books SET stock_quantity = stock_quantity + ?delta      │
//! │     WHERE book_id = ? AND stock_quantity + ?delta >= 0             │
//! │                                                                     │
//! │  0 rows affected → book missing or not enough copies               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use bookstore_core::input::{BookFilter, BookInput};
use bookstore_core::stock::StockAdjustment;
use bookstore_core::{Book, BookListing, CoreError};

const BOOK_COLUMNS: &str =
    "book_id, title, author_id, category_id, isbn, stock_quantity, price_cents, created_at";

const LISTING_SELECT: &str = r#"
    SELECT
        b.book_id,
        b.title,
        b.author_id,
        a.name AS author_name,
        b.category_id,
        c.name AS category_name,
        b.isbn,
        b.stock_quantity,
        b.price_cents,
        b.created_at
    FROM books b
    LEFT JOIN authors a ON a.author_id = b.author_id
    LEFT JOIN categories c ON c.category_id = b.category_id
"#;

/// Repository for book database operations.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Lists books, newest first, with author and category names.
    ///
    /// ## Filters
    /// - `title` - case-insensitive substring
    /// - `category_id`, `author_id` - exact match
    ///
    /// An empty filter returns every book.
    pub async fn list(&self, filter: &BookFilter) -> DbResult<Vec<BookListing>> {
        debug!(?filter, "Listing books");

        let title_pattern = filter.title.as_deref().map(contains_pattern);

        let sql = format!(
            r#"{LISTING_SELECT}
            WHERE (?1 IS NULL OR b.title LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR b.category_id = ?2)
              AND (?3 IS NULL OR b.author_id = ?3)
            ORDER BY b.created_at DESC, b.book_id DESC
            "#
        );

        let books = sqlx::query_as::<_, BookListing>(&sql)
            .bind(title_pattern)
            .bind(filter.category_id)
            .bind(filter.author_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = books.len(), "Book listing returned");
        Ok(books)
    }

    /// Gets a book by id.
    pub async fn get(&self, book_id: i64) -> DbResult<Book> {
        let mut conn = self.pool.acquire().await?;
        find_in(&mut conn, book_id)
            .await?
            .ok_or_else(|| DbError::not_found("Book", book_id))
    }

    /// Gets a book by id with author and category names.
    pub async fn get_listing(&self, book_id: i64) -> DbResult<BookListing> {
        let sql = format!("{LISTING_SELECT} WHERE b.book_id = ?1");
        sqlx::query_as::<_, BookListing>(&sql)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Book", book_id))
    }

    /// Inserts a new book.
    ///
    /// ## Returns
    /// * `Ok(Book)` - Inserted book
    /// * `Err(DbError::ForeignKeyViolation)` - author or category doesn't exist
    /// * `Err(DbError::SequenceConflict)` - id sequence out of sync
    pub async fn create(&self, input: BookInput) -> DbResult<Book> {
        let input = input.validate()?;
        debug!(title = %input.title, "Inserting book");

        let sql = format!(
            r#"
            INSERT INTO books (title, author_id, category_id, isbn, stock_quantity, price_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {BOOK_COLUMNS}
            "#
        );

        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(&input.title)
            .bind(input.author_id)
            .bind(input.category_id)
            .bind(&input.isbn)
            .bind(input.stock_quantity)
            .bind(input.price_cents)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(book)
    }

    /// Overwrites a book's editable fields, including its shelf count.
    pub async fn update(&self, book_id: i64, input: BookInput) -> DbResult<Book> {
        let input = input.validate()?;
        debug!(book_id, "Updating book");

        let sql = format!(
            r#"
            UPDATE books SET
                title = ?2,
                author_id = ?3,
                category_id = ?4,
                isbn = ?5,
                stock_quantity = ?6,
                price_cents = ?7
            WHERE book_id = ?1
            RETURNING {BOOK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Book>(&sql)
            .bind(book_id)
            .bind(&input.title)
            .bind(input.author_id)
            .bind(input.category_id)
            .bind(&input.isbn)
            .bind(input.stock_quantity)
            .bind(input.price_cents)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Book", book_id))
    }

    /// Deletes a book.
    ///
    /// ## Returns
    /// * `Err(DbError::InUse)` - the book appears on an order or purchase
    pub async fn delete(&self, book_id: i64) -> DbResult<()> {
        debug!(book_id, "Deleting book");

        let result = sqlx::query("DELETE FROM books WHERE book_id = ?1")
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::from(e).on_delete("book", "it appears on existing orders or purchases")
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", book_id));
        }

        Ok(())
    }

    /// Counts books in the catalogue.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Reads a book on the given connection (usually inside a transaction).
pub(crate) async fn find_in(conn: &mut SqliteConnection, book_id: i64) -> DbResult<Option<Book>> {
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE book_id = ?1");
    let book = sqlx::query_as::<_, Book>(&sql)
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(book)
}

/// Reads a book or fails with [`CoreError::BookNotFound`].
pub(crate) async fn require_in(conn: &mut SqliteConnection, book_id: i64) -> DbResult<Book> {
    find_in(conn, book_id)
        .await?
        .ok_or_else(|| CoreError::BookNotFound(book_id).into())
}

/// Applies a stock adjustment with a guarded update.
///
/// ## Returns
/// * `Err(CoreError::BookNotFound)` - no such book
/// * `Err(CoreError::InsufficientStock)` - the delta would take stock below zero
pub(crate) async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    adjustment: StockAdjustment,
) -> DbResult<()> {
    debug!(
        book_id = adjustment.book_id,
        delta = adjustment.delta,
        "Adjusting stock"
    );

    let result = sqlx::query(
        r#"
        UPDATE books
        SET stock_quantity = stock_quantity + ?2
        WHERE book_id = ?1 AND stock_quantity + ?2 >= 0
        "#,
    )
    .bind(adjustment.book_id)
    .bind(adjustment.delta)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let book = require_in(conn, adjustment.book_id).await?;
    Err(CoreError::InsufficientStock {
        book_id: book.book_id,
        title: book.title,
        available: book.stock_quantity,
        requested: -adjustment.delta,
    }
    .into())
}

// =============================================================================
// Unit Tests
// =============================================================================
