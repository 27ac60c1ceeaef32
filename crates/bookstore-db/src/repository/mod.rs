//! # Repository Module
//!
//! Database repository implementations for the back-office.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.orders().create(input)                                     │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── create(input)       ─┐                                            │
//! │  ├── update(id, input)    ├── one SQLite transaction each              │
//! │  └── delete(id)          ─┘                                            │
//! │       │                                                                 │
//! │       │  shares helpers with other repositories:                       │
//! │       │    customer::find_or_create_in(&mut conn, ..)                  │
//! │       │    book::find_in(&mut conn, ..)                                │
//! │       │    book::apply_stock_delta(&mut conn, ..)                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Helpers that end in `_in` take a `&mut SqliteConnection` so they can run
//! inside a caller's transaction. Flows that read and then write open that
//! transaction with [`begin_write`].
//!
//! ## Available Repositories
//!
//! - [`author::AuthorRepository`], [`category::CategoryRepository`],
//!   [`book::BookRepository`] - catalogue CRUD and search
//! - [`customer::CustomerRepository`], [`supplier::SupplierRepository`] - parties
//! - [`order::OrderRepository`] - order flow with stock reconciliation
//! - [`purchase::PurchaseRepository`] - purchase receiving flow
//! - [`report::ReportRepository`] - report source rows
//! - [`dashboard::DashboardRepository`] - headline counts
//! - [`user::UserRepository`], [`session::SessionRepository`] - sign-in

pub mod author;
pub mod book;
pub mod category;
pub mod customer;
pub mod dashboard;
pub mod order;
pub mod purchase;
pub mod report;
pub mod session;
pub mod supplier;
pub mod user;

use sqlx::{Sqlite, SqlitePool, Transaction};

/// Opens a transaction that takes the write lock up front (`BEGIN IMMEDIATE`).
///
/// A deferred transaction that reads before writing fails with
/// `SQLITE_BUSY_SNAPSHOT` when another writer commits in between. An
/// immediate one waits on the busy timeout instead.
pub(crate) async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// Builds a `LIKE` pattern matching `needle` anywhere, with `%`, `_` and
/// `\` escaped. Use with `ESCAPE '\'`.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes() {
        assert_eq!(contains_pattern("dune"), "%dune%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
