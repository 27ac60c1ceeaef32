//! # Stock Planning
//!
//! Decides how book stock must move when an order or purchase is saved.
//! The database layer applies the resulting adjustments inside the same
//! transaction that writes the order or purchase rows.
//!
//! ## Order Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CREATE   qty=3 of book 7, shelf=5                                     │
//! │           → [ book 7: -3 ]                                             │
//! │                                                                         │
//! │  EDIT     same book 7, qty 3 → 5, shelf=2                              │
//! │           available = shelf + old qty = 5                              │
//! │           → [ book 7: 3 - 5 = -2 ]                                     │
//! │                                                                         │
//! │  EDIT     book 7 qty 3 → book 9 qty 4, shelf(9)=10                     │
//! │           → [ book 7: +3, book 9: -4 ]                                 │
//! │                                                                         │
//! │  DELETE   qty=3 of book 7                                              │
//! │           → [ book 7: +3 ]                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A negative delta takes copies off the shelf; a positive delta puts them
//! back (or receives them from a supplier).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::input::ValidPurchaseLine;

// =============================================================================
// Types
// =============================================================================

/// A book and a number of copies, as held by a single order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub book_id: i64,
    pub quantity: i64,
}

impl OrderLine {
    pub const fn new(book_id: i64, quantity: i64) -> Self {
        OrderLine { book_id, quantity }
    }
}

/// A signed change to one book's `stock_quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub book_id: i64,
    pub delta: i64,
}

impl StockAdjustment {
    pub const fn new(book_id: i64, delta: i64) -> Self {
        StockAdjustment { book_id, delta }
    }

    /// Stock after applying this adjustment, or `None` if it would go negative.
    pub fn apply_to(&self, stock: i64) -> Option<i64> {
        let next = stock.checked_add(self.delta)?;
        (next >= 0).then_some(next)
    }
}

/// The shelf cannot cover an order line.
///
/// Carries no title; the caller knows the book and turns this into
/// [`CoreError::InsufficientStock`] with [`Shortfall::for_title`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub book_id: i64,
    pub available: i64,
    pub requested: i64,
}

impl Shortfall {
    pub fn for_title(self, title: impl Into<String>) -> CoreError {
        CoreError::InsufficientStock {
            book_id: self.book_id,
            title: title.into(),
            available: self.available,
            requested: self.requested,
        }
    }
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "book {}: available {}, requested {}",
            self.book_id, self.available, self.requested
        )
    }
}

impl std::error::Error for Shortfall {}

pub type PlanResult = Result<Vec<StockAdjustment>, Shortfall>;

// =============================================================================
// Order Planning
// =============================================================================

/// Plans a new order line against the book's current shelf count.
///
/// Rejects before any write when `line.quantity > available`.
pub fn plan_order_create(line: OrderLine, available: i64) -> PlanResult {
    if line.quantity > available {
        return Err(Shortfall {
            book_id: line.book_id,
            available,
            requested: line.quantity,
        });
    }

    Ok(vec![StockAdjustment::new(line.book_id, -line.quantity)])
}

/// Plans an edit of an existing order line.
///
/// `new_book_stock` is the current shelf count of `new.book_id`. When the
/// book is unchanged the order's own copies count as available, so the
/// check is against `new_book_stock + old.quantity`.
///
/// Returns an empty plan when nothing moves (same book, same quantity).
pub fn plan_order_edit(old: OrderLine, new: OrderLine, new_book_stock: i64) -> PlanResult {
    if old.book_id == new.book_id {
        let available = new_book_stock + old.quantity;
        if new.quantity > available {
            return Err(Shortfall {
                book_id: new.book_id,
                available,
                requested: new.quantity,
            });
        }

        let delta = old.quantity - new.quantity;
        if delta == 0 {
            return Ok(Vec::new());
        }
        return Ok(vec![StockAdjustment::new(new.book_id, delta)]);
    }

    if new.quantity > new_book_stock {
        return Err(Shortfall {
            book_id: new.book_id,
            available: new_book_stock,
            requested: new.quantity,
        });
    }

    Ok(vec![
        StockAdjustment::new(old.book_id, old.quantity),
        StockAdjustment::new(new.book_id, -new.quantity),
    ])
}

/// Plans the stock restoration for a deleted order: the copies go back.
pub fn plan_order_delete(line: OrderLine) -> Vec<StockAdjustment> {
    vec![StockAdjustment::new(line.book_id, line.quantity)]
}

// =============================================================================
// Purchase Planning
// =============================================================================

/// Plans the stock increments for a received purchase.
///
/// Lines for the same book are merged into one adjustment. Output is
/// ordered by book id so concurrent receipts touch rows in the same order.
///
/// Fails with `ValidationError::OutOfRange` if a merged quantity does not
/// fit in `i64`.
pub fn plan_purchase_receipt(lines: &[ValidPurchaseLine]) -> CoreResult<Vec<StockAdjustment>> {
    let mut per_book: BTreeMap<i64, i64> = BTreeMap::new();
    for line in lines {
        let merged = per_book.entry(line.book_id).or_insert(0);
        *merged = merged
            .checked_add(line.quantity)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: i64::MAX,
            })?;
    }

    Ok(per_book
        .into_iter()
        .map(|(book_id, delta)| StockAdjustment::new(book_id, delta))
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_within_stock() {
        let plan = plan_order_create(OrderLine::new(1, 5), 5).unwrap();
        assert_eq!(plan, vec![StockAdjustment::new(1, -5)]);
    }

    #[test]
    fn test_create_over_stock_rejected() {
        let err = plan_order_create(OrderLine::new(1, 6), 5).unwrap_err();
        assert_eq!(err.available, 5);
        assert_eq!(err.requested, 6);

        let core = err.for_title("Dune");
        assert!(matches!(core, CoreError::InsufficientStock { book_id: 1, .. }));
    }

    #[test]
    fn test_edit_same_book_changes_by_difference() {
        // 3 → 5 with 2 on the shelf: order's own 3 count as available
        let plan = plan_order_edit(OrderLine::new(1, 3), OrderLine::new(1, 5), 2).unwrap();
        assert_eq!(plan, vec![StockAdjustment::new(1, -2)]);

        // 5 → 2 gives 3 back
        let plan = plan_order_edit(OrderLine::new(1, 5), OrderLine::new(1, 2), 0).unwrap();
        assert_eq!(plan, vec![StockAdjustment::new(1, 3)]);
    }

    #[test]
    fn test_edit_same_book_over_available() {
        let err = plan_order_edit(OrderLine::new(1, 3), OrderLine::new(1, 6), 2).unwrap_err();
        assert_eq!(err.available, 5);
        assert_eq!(err.requested, 6);
    }

    #[test]
    fn test_edit_unchanged_is_empty() {
        let plan = plan_order_edit(OrderLine::new(1, 3), OrderLine::new(1, 3), 0).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_edit_switch_book() {
        let plan = plan_order_edit(OrderLine::new(1, 3), OrderLine::new(2, 4), 10).unwrap();
        assert_eq!(
            plan,
            vec![StockAdjustment::new(1, 3), StockAdjustment::new(2, -4)]
        );

        // old book's copies do not help the new book
        let err = plan_order_edit(OrderLine::new(1, 3), OrderLine::new(2, 4), 3).unwrap_err();
        assert_eq!(err.book_id, 2);
        assert_eq!(err.available, 3);
    }

    #[test]
    fn test_delete_restores_quantity() {
        assert_eq!(
            plan_order_delete(OrderLine::new(4, 7)),
            vec![StockAdjustment::new(4, 7)]
        );
    }

    #[test]
    fn test_purchase_receipt_merges_lines() {
        let lines = vec![
            ValidPurchaseLine { book_id: 9, quantity: 2, unit_cost_cents: 100 },
            ValidPurchaseLine { book_id: 3, quantity: 5, unit_cost_cents: 100 },
            ValidPurchaseLine { book_id: 9, quantity: 1, unit_cost_cents: 150 },
        ];

        assert_eq!(
            plan_purchase_receipt(&lines).unwrap(),
            vec![StockAdjustment::new(3, 5), StockAdjustment::new(9, 3)]
        );
    }

    #[test]
    fn test_purchase_receipt_merge_overflow_is_an_error() {
        let lines = vec![
            ValidPurchaseLine { book_id: 1, quantity: i64::MAX, unit_cost_cents: 1 },
            ValidPurchaseLine { book_id: 1, quantity: 1, unit_cost_cents: 1 },
        ];

        let err = plan_purchase_receipt(&lines).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_apply_to() {
        assert_eq!(StockAdjustment::new(1, -3).apply_to(5), Some(2));
        assert_eq!(StockAdjustment::new(1, -6).apply_to(5), None);
        assert_eq!(StockAdjustment::new(1, 4).apply_to(0), Some(4));
    }
}
