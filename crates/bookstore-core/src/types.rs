//! # Domain Types
//!
//! Entities as stored in the back-office database.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Author ◄──┐          ┌──► Category                                    │
//! │            │          │                                                 │
//! │          ┌─┴──────────┴─┐                                               │
//! │          │     Book     │ stock_quantity, price_cents                   │
//! │          └─┬──────────┬─┘                                               │
//! │            │          │                                                 │
//! │   OrderDetail      PurchaseDetail                                       │
//! │       │                  │                                              │
//! │     Order ──► Customer  Purchase ──► Supplier                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entity ids are database-assigned integers. Listing types (`BookListing`,
//! `OrderSummary`, `PurchaseSummary`) carry the related names a table view
//! needs so the client never has to join.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Catalogue
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Author {
    pub author_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// A title the store stocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Book {
    pub book_id: i64,
    pub title: String,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub isbn: Option<String>,

    /// Copies currently available for sale. Never negative.
    pub stock_quantity: i64,

    /// Selling price in cents.
    pub price_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Book {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` copies can be taken off the shelf.
    pub fn can_fill(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }
}

/// A book row with its author and category names embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BookListing {
    pub book_id: i64,
    pub title: String,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub isbn: Option<String>,
    pub stock_quantity: i64,
    pub price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Parties
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub customer_id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub supplier_id: i64,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub address: String,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney,
}

impl PaymentMethod {
    /// Label shown on screens and in exported workbooks.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::MobileMoney => "Mobile Money",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order header. One order sells one book (see [`OrderDetail`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub order_id: i64,
    pub customer_id: i64,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    /// quantity × unit price, in cents.
    pub total_amount_cents: i64,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// The single line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderDetail {
    pub order_detail_id: i64,
    pub order_id: i64,
    pub book_id: i64,
    pub quantity: i64,
    /// Unit price charged, in cents.
    pub price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Order row for the orders table view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderSummary {
    pub order_id: i64,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub total_amount_cents: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub customer_email: Option<String>,
    pub book_id: Option<i64>,
    pub book_title: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price_cents: Option<i64>,
}

/// An order header together with its line and customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderWithDetail {
    pub order: Order,
    pub detail: OrderDetail,
    pub customer: Customer,
}

// =============================================================================
// Purchases
// =============================================================================

/// Receiving state of a supplier purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    /// Goods are on the shelf; stock has been incremented.
    #[default]
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub purchase_id: i64,
    pub supplier_id: Option<i64>,
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
    pub status: PurchaseStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseDetail {
    pub purchase_detail_id: i64,
    pub purchase_id: i64,
    pub book_id: i64,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

impl PurchaseDetail {
    #[inline]
    pub fn line_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents).multiply_quantity(self.quantity)
    }
}

/// Purchase row for the purchases table view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseSummary {
    pub purchase_id: i64,
    pub supplier_id: Option<i64>,
    pub supplier_name: Option<String>,
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
    pub status: PurchaseStatus,
    pub line_count: i64,
    pub total_cost_cents: i64,
}

/// A purchase line with the book title, for the purchase detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseLineView {
    pub purchase_detail_id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseWithLines {
    pub purchase: Purchase,
    pub supplier_name: Option<String>,
    pub lines: Vec<PurchaseLineView>,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline counts for the dashboard tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardCounts {
    pub books: i64,
    pub customers: i64,
    pub orders: i64,
    pub revenue_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn book(stock: i64) -> Book {
        Book {
            book_id: 1,
            title: "Dune".to_string(),
            author_id: None,
            category_id: None,
            isbn: None,
            stock_quantity: stock,
            price_cents: 2500,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_book_can_fill() {
        let b = book(3);
        assert!(b.can_fill(3));
        assert!(!b.can_fill(4));
        assert_eq!(b.price().cents(), 2500);
    }

    #[test]
    fn test_payment_method_serde() {
        let json = serde_json::to_string(&PaymentMethod::MobileMoney).unwrap();
        assert_eq!(json, "\"mobile_money\"");
        let parsed: PaymentMethod = serde_json::from_str("\"card\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Card);
        assert_eq!(PaymentMethod::MobileMoney.to_string(), "Mobile Money");
    }

    #[test]
    fn test_purchase_status_default() {
        assert_eq!(PurchaseStatus::default(), PurchaseStatus::Received);
    }

    #[test]
    fn test_purchase_line_cost() {
        let line = PurchaseDetail {
            purchase_detail_id: 1,
            purchase_id: 1,
            book_id: 1,
            quantity: 4,
            unit_cost_cents: 1250,
        };
        assert_eq!(line.line_cost().cents(), 5000);
    }
}
