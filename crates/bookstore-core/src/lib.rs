//! # bookstore-core: Pure Business Logic for the Bookstore Back-Office
//!
//! This crate holds the rules of the back-office as pure functions with zero
//! I/O dependencies. The database crate persists what this crate decides.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Bookstore Back-Office Architecture                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (axum)                              │   │
//! │  │    /books, /orders, /purchases, /reports, /auth                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ bookstore-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │  stock  │ │ report  │ │  input  │  │   │
//! │  │   │  Book   │ │  Money  │ │ planner │ │ buckets │ │ drafts  │  │   │
//! │  │   │  Order  │ │         │ │         │ │turnover │ │ checks  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 bookstore-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, transactional flows          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stored entities (Book, Order, Purchase, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`input`] - Create/update payloads and their validation
//! - [`stock`] - Stock adjustment planning for orders and purchases
//! - [`report`] - Sales, inventory and customer aggregation
//! - [`session`] - The signed-in user carried through a request
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validators
//!
//! ## Example Usage
//!
//! ```rust
//! use bookstore_core::stock::{plan_order_create, OrderLine};
//!
//! // 3 copies requested, 5 on the shelf: stock goes down by 3
//! let plan = plan_order_create(OrderLine::new(7, 3), 5).unwrap();
//! assert_eq!(plan[0].book_id, 7);
//! assert_eq!(plan[0].delta, -3);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod input;
pub mod money;
pub mod report;
pub mod session;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum copies of a single book on one order or purchase line.
///
/// Catches typing 1000 instead of 10 on the order form.
pub const MAX_LINE_QUANTITY: i64 = 10_000;

/// Maximum unit price or unit cost, in cents (one billion in major units).
///
/// Keeps `price × MAX_LINE_QUANTITY` and purchase totals inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Maximum lines accepted on a single purchase.
pub const MAX_PURCHASE_LINES: usize = 200;

/// Default number of books in the "top sellers" ranking.
pub const DEFAULT_TOP_N: usize = 10;

/// Default stock level at or below which a book counts as "low stock".
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Category label for order lines whose book has no category.
pub const UNCATEGORIZED: &str = "Uncategorized";
