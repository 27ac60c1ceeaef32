//! # Input Payloads
//!
//! What the HTTP layer deserializes for create and update requests, and the
//! checks each payload runs before the database is touched.
//!
//! Every `validate` consumes the payload and returns a normalized copy
//! (trimmed strings, blank optionals mapped to `None`), so repositories only
//! ever write cleaned data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::PaymentMethod;
use crate::validation::{
    normalize_optional, validate_email, validate_id, validate_isbn, validate_name,
    validate_price_cents, validate_quantity, validate_search_query, validate_stock_quantity,
    validate_title, ValidationResult,
};
use crate::MAX_PURCHASE_LINES;

// =============================================================================
// Catalogue
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuthorInput {
    pub name: String,
}

impl AuthorInput {
    pub fn validate(self) -> ValidationResult<Self> {
        Ok(AuthorInput {
            name: validate_name("name", &self.name)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryInput {
    pub fn validate(self) -> ValidationResult<Self> {
        Ok(CategoryInput {
            name: validate_name("name", &self.name)?,
            description: normalize_optional(self.description.as_deref()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookInput {
    pub title: String,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub stock_quantity: i64,
    pub price_cents: i64,
}

impl BookInput {
    pub fn validate(self) -> ValidationResult<Self> {
        let title = validate_title(&self.title)?;

        if let Some(id) = self.author_id {
            validate_id("author_id", id)?;
        }
        if let Some(id) = self.category_id {
            validate_id("category_id", id)?;
        }

        let isbn = normalize_optional(self.isbn.as_deref());
        if let Some(isbn) = &isbn {
            validate_isbn(isbn)?;
        }

        validate_stock_quantity(self.stock_quantity)?;
        validate_price_cents(self.price_cents)?;

        Ok(BookInput {
            title,
            isbn,
            ..self
        })
    }
}

/// Query string accepted by `GET /books`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookFilter {
    /// Case-insensitive substring of the title.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub author_id: Option<i64>,
}

impl BookFilter {
    pub fn validate(self) -> ValidationResult<Self> {
        let title = match self.title {
            Some(q) => Some(validate_search_query(&q)?).filter(|q| !q.is_empty()),
            None => None,
        };

        Ok(BookFilter { title, ..self })
    }
}

// =============================================================================
// Parties
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl CustomerInput {
    pub fn validate(self) -> ValidationResult<Self> {
        let email = normalize_optional(self.email.as_deref());
        if let Some(email) = &email {
            validate_email(email)?;
        }

        Ok(CustomerInput {
            name: validate_name("name", &self.name)?,
            contact: normalize_optional(self.contact.as_deref()),
            email,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierInput {
    pub name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

impl SupplierInput {
    /// Name is required. Contact, email and address may be blank but an
    /// email, when given, must be well formed.
    pub fn validate(self) -> ValidationResult<Self> {
        let email = self.email.trim().to_string();
        if !email.is_empty() {
            validate_email(&email)?;
        }

        Ok(SupplierInput {
            name: validate_name("name", &self.name)?,
            contact: self.contact.trim().to_string(),
            email,
            address: self.address.trim().to_string(),
        })
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Body of `POST /orders` and `PUT /orders/{id}`.
///
/// The customer is given by name and resolved (or created) by the order
/// flow; contact and email are only used when a new customer is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderInput {
    pub customer_name: String,
    #[serde(default)]
    pub customer_contact: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub book_id: i64,
    pub quantity: i64,
    /// Unit price in cents; the book's current price when omitted.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub order_date: Option<DateTime<Utc>>,
}

impl OrderInput {
    pub fn validate(self) -> ValidationResult<Self> {
        let customer_name = validate_name("customer_name", &self.customer_name)?;

        let customer_email = normalize_optional(self.customer_email.as_deref());
        if let Some(email) = &customer_email {
            validate_email(email)?;
        }

        validate_id("book_id", self.book_id)?;
        validate_quantity(self.quantity)?;
        if let Some(price) = self.unit_price_cents {
            validate_price_cents(price)?;
        }

        Ok(OrderInput {
            customer_name,
            customer_contact: normalize_optional(self.customer_contact.as_deref()),
            customer_email,
            ..self
        })
    }

    /// The customer block of this order, for find-or-create.
    pub fn customer(&self) -> CustomerInput {
        CustomerInput {
            name: self.customer_name.clone(),
            contact: self.customer_contact.clone(),
            email: self.customer_email.clone(),
        }
    }
}

// =============================================================================
// Purchases
// =============================================================================

/// One row of the purchase form. Rows are allowed to be incomplete; the
/// incomplete ones are dropped by [`PurchaseInput::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseLineInput {
    #[serde(default)]
    pub book_id: Option<i64>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit_cost_cents: i64,
}

impl PurchaseLineInput {
    /// A line counts when it names a book and has a positive quantity and
    /// unit cost.
    pub fn to_valid(&self) -> Option<ValidPurchaseLine> {
        match self.book_id {
            Some(book_id) if book_id > 0 && self.quantity > 0 && self.unit_cost_cents > 0 => {
                Some(ValidPurchaseLine {
                    book_id,
                    quantity: self.quantity,
                    unit_cost_cents: self.unit_cost_cents,
                })
            }
            _ => None,
        }
    }
}

/// A purchase line that passed the completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidPurchaseLine {
    pub book_id: i64,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

/// Body of `POST /purchases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseInput {
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lines: Vec<PurchaseLineInput>,
}

/// A purchase ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPurchase {
    pub supplier_id: i64,
    pub purchase_date: Option<DateTime<Utc>>,
    pub lines: Vec<ValidPurchaseLine>,
}

impl PurchaseInput {
    /// Lines that will be persisted; the rest are silently dropped.
    pub fn valid_lines(&self) -> Vec<ValidPurchaseLine> {
        self.lines.iter().filter_map(PurchaseLineInput::to_valid).collect()
    }

    /// Checks the supplier and keeps the valid lines.
    ///
    /// ## Errors
    /// - `supplier_id` missing → `ValidationError::Required`
    /// - more than `MAX_PURCHASE_LINES` rows → `ValidationError::OutOfRange`
    /// - a kept line above `MAX_LINE_QUANTITY` copies or `MAX_PRICE_CENTS`
    ///   unit cost → `ValidationError::OutOfRange`
    /// - no valid line left → `CoreError::NoValidPurchaseLines`
    pub fn validate(&self) -> CoreResult<ValidPurchase> {
        let supplier_id = self
            .supplier_id
            .ok_or_else(|| ValidationError::required("supplier_id"))?;
        validate_id("supplier_id", supplier_id)?;

        if self.lines.len() > MAX_PURCHASE_LINES {
            return Err(ValidationError::OutOfRange {
                field: "lines".to_string(),
                min: 1,
                max: MAX_PURCHASE_LINES as i64,
            }
            .into());
        }

        let lines = self.valid_lines();
        if lines.is_empty() {
            return Err(CoreError::NoValidPurchaseLines);
        }

        for line in &lines {
            validate_quantity(line.quantity)?;
            validate_price_cents(line.unit_cost_cents)?;
        }

        Ok(ValidPurchase {
            supplier_id,
            purchase_date: self.purchase_date,
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
    use crate::{MAX_LINE_QUANTITY, MAX_PRICE_CENTS};

    fn line(book_id: Option<i64>, quantity: i64, unit_cost_cents: i64) -> PurchaseLineInput {
        PurchaseLineInput {
            book_id,
            quantity,
            unit_cost_cents,
        }
    }

    #[test]
    fn test_book_input_normalizes() {
        let input = BookInput {
            title: "  Half of a Yellow Sun ".to_string(),
            author_id: Some(1),
            category_id: None,
            isbn: Some("   ".to_string()),
            stock_quantity: 4,
            price_cents: 3500,
        }
        .validate()
        .unwrap();

        assert_eq!(input.title, "Half of a Yellow Sun");
        assert_eq!(input.isbn, None);
    }

    #[test]
    fn test_book_input_rejects_negative_stock() {
        let input = BookInput {
            title: "Dune".to_string(),
            author_id: None,
            category_id: None,
            isbn: None,
            stock_quantity: -1,
            price_cents: 100,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_customer_input_email_checked_only_when_present() {
        let ok = CustomerInput {
            name: "Amina".to_string(),
            contact: Some("".to_string()),
            email: Some(" ".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.contact, None);
        assert_eq!(ok.email, None);

        let bad = CustomerInput {
            name: "Amina".to_string(),
            contact: None,
            email: Some("amina".to_string()),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_order_input_validation() {
        let input = OrderInput {
            customer_name: " Jane ".to_string(),
            customer_contact: None,
            customer_email: None,
            book_id: 1,
            quantity: 2,
            unit_price_cents: None,
            payment_method: PaymentMethod::Cash,
            order_date: None,
        };
        let input = input.validate().unwrap();
        assert_eq!(input.customer().name, "Jane");

        let zero_qty = OrderInput { quantity: 0, ..input.clone() };
        assert!(zero_qty.validate().is_err());

        let no_name = OrderInput { customer_name: "".to_string(), ..input };
        assert!(no_name.validate().is_err());
    }

    #[test]
    fn test_purchase_drops_invalid_lines() {
        let input = PurchaseInput {
            supplier_id: Some(1),
            purchase_date: None,
            lines: vec![
                line(Some(1), 3, 500),
                line(None, 3, 500),
                line(Some(2), 0, 500),
                line(Some(3), 2, 0),
                line(Some(4), 1, 900),
            ],
        };

        let valid = input.validate().unwrap();
        assert_eq!(valid.supplier_id, 1);
        assert_eq!(
            valid.lines.iter().map(|l| l.book_id).collect::<Vec<_>>(),
            vec![1, 4]
        );
    }

    #[test]
    fn test_purchase_rejects_oversized_lines() {
        let merged_overflow = PurchaseInput {
            supplier_id: Some(1),
            purchase_date: None,
            lines: vec![line(Some(1), i64::MAX, 1), line(Some(1), 1, 1)],
        };
        assert!(matches!(
            merged_overflow.validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. })) if field == "quantity"
        ));

        let costly = PurchaseInput {
            supplier_id: Some(1),
            purchase_date: None,
            lines: vec![line(Some(2), 1, MAX_PRICE_CENTS + 1)],
        };
        assert!(matches!(
            costly.validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. })) if field == "price"
        ));

        let at_limits = PurchaseInput {
            supplier_id: Some(1),
            purchase_date: None,
            lines: vec![line(Some(3), MAX_LINE_QUANTITY, MAX_PRICE_CENTS)],
        };
        assert!(at_limits.validate().is_ok());
    }

    #[test]
    fn test_purchase_requires_supplier() {
        let input = PurchaseInput {
            supplier_id: None,
            purchase_date: None,
            lines: vec![line(Some(1), 1, 100)],
        };
        assert!(matches!(
            input.validate(),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[test]
    fn test_purchase_requires_a_valid_line() {
        let input = PurchaseInput {
            supplier_id: Some(1),
            purchase_date: None,
            lines: vec![line(None, 1, 100), line(Some(1), -1, 100)],
        };
        assert!(matches!(input.validate(), Err(CoreError::NoValidPurchaseLines)));
    }

    #[test]
    fn test_book_filter_blank_title_is_none() {
        let filter = BookFilter {
            title: Some("  ".to_string()),
            category_id: Some(2),
            author_id: None,
        }
        .validate()
        .unwrap();
        assert_eq!(filter.title, None);
        assert_eq!(filter.category_id, Some(2));
    }
}
