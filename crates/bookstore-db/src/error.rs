//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        CoreError (stock, purchase lines)   │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in bookstore-api) ← code + message for the client           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bookstore_core::{CoreError, ValidationError};
use thiserror::Error;

/// Integer primary keys of every table. A UNIQUE failure on one of these
/// means the id sequence handed out a value that is already taken.
const PRIMARY_KEYS: &[(&str, &str)] = &[
    ("authors", "author_id"),
    ("categories", "category_id"),
    ("books", "book_id"),
    ("customers", "customer_id"),
    ("suppliers", "supplier_id"),
    ("orders", "order_id"),
    ("order_details", "order_detail_id"),
    ("purchases", "purchase_id"),
    ("purchase_details", "purchase_detail_id"),
    ("users", "user_id"),
    ("sessions", "session_id"),
];

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation on a non-key column.
    ///
    /// ## When This Occurs
    /// - Provisioning a user with an email that already exists
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Unique constraint violation on a primary key.
    ///
    /// ## When This Occurs
    /// - Rows were imported with explicit ids and the table's sequence was
    ///   never moved past them
    #[error("Database sequence error for {column}. Please reset the {table} id sequence.")]
    SequenceConflict { table: String, column: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a book, author, category or supplier that doesn't exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A row cannot be deleted while other rows reference it.
    ///
    /// ## When This Occurs
    /// - Deleting a customer who has orders
    /// - Deleting a book that appears on an order or purchase
    /// - Deleting a supplier with purchases, or a category with books
    #[error("Cannot delete {entity}: {reason}")]
    InUse { entity: String, reason: String },

    /// CHECK constraint violation (negative stock, bad enum text).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Business rule rejected the write (insufficient stock, bad input).
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Turns a foreign key failure raised by a DELETE into [`DbError::InUse`].
    ///
    /// Any other error passes through unchanged.
    pub fn on_delete(self, entity: &str, reason: &str) -> Self {
        match self {
            DbError::ForeignKeyViolation { .. } => DbError::InUse {
                entity: entity.to_string(),
                reason: reason.to_string(),
            },
            other => other,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
///   UNIQUE on <table>.<pk>    → DbError::SequenceConflict
///   UNIQUE on other column    → DbError::UniqueViolation
///   FOREIGN KEY               → DbError::ForeignKeyViolation
///   CHECK                     → DbError::CheckViolation
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                // CHECK constraint: "CHECK constraint failed: <expr>"
                if let Some(target) = msg.split("UNIQUE constraint failed: ").nth(1) {
                    unique_violation(target.trim())
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

fn unique_violation(target: &str) -> DbError {
    let (table, column) = target.split_once('.').unwrap_or(("unknown", target));

    let is_primary_key = PRIMARY_KEYS
        .iter()
        .any(|(t, c)| *t == table && *c == column);

    if is_primary_key {
        DbError::SequenceConflict {
            table: table.to_string(),
            column: column.to_string(),
        }
    } else {
        DbError::UniqueViolation {
            field: target.to_string(),
            value: "unknown".to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
