//! # Session Types
//!
//! The signed-in back-office user, passed explicitly to whatever needs it.
//!
//! ## Lifecycle
//! ```text
//! sign-in ──► session row + token ──► CurrentUser on every request
//!                                          │
//! sign-out ──► session row deleted ──► token rejected from then on
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::validation::{validate_email, validate_password, ValidationResult};

/// A stored back-office user. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserRecord {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The user a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrentUser {
    pub user_id: i64,
    pub name: String,
    pub email: String,
}

impl From<&UserRecord> for CurrentUser {
    fn from(user: &UserRecord) -> Self {
        CurrentUser {
            user_id: user.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Body of `POST /auth/sign-in`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, TS)]
#[ts(export)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

impl SignInInput {
    /// Lower-cases and trims the email; the password is left as typed.
    pub fn validate(self) -> ValidationResult<Self> {
        let email = self.email.trim().to_lowercase();
        validate_email(&email)?;
        validate_password(&self.password)?;
        Ok(SignInInput {
            email,
            password: self.password,
        })
    }
}

/// Returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SignedIn {
    pub token: String,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
    pub user: CurrentUser,
}
