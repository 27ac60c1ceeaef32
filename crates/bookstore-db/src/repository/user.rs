//! # User Repository
//!
//! Back-office users and their argon2 password hashes.
//!
//! Plain-text passwords only pass through [`UserRepository::create`] and
//! [`UserRepository::verify_credentials`]; only the PHC hash string is stored.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use bookstore_core::session::UserRecord;
use bookstore_core::validation::{validate_email, validate_name, validate_password};

const COLUMNS: &str = "user_id, name, email, password_hash, created_at";

/// Repository for back-office users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Provisions a user. The email is stored lower-cased.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn create(&self, name: &str, email: &str, password: &str) -> DbResult<UserRecord> {
        let name = validate_name("name", name)?;
        let email = email.trim().to_lowercase();
        validate_email(&email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;
        debug!(email = %email, "Inserting user");

        let sql = format!(
            "INSERT INTO users (name, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(&name)
            .bind(&email)
            .bind(&password_hash)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("email", email.clone()),
                other => other,
            })?;

        info!(user_id = user.user_id, "User created");
        Ok(user)
    }

    /// Gets a user by id.
    pub async fn get(&self, user_id: i64) -> DbResult<UserRecord> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE user_id = ?1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", user_id))
    }

    /// Finds a user by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE email = ?1");
        let user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Checks an email/password pair.
    ///
    /// Returns `None` for an unknown email and for a wrong password alike.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> DbResult<Option<UserRecord>> {
        let Some(user) = self.find_by_email(email).await? else {
            debug!("Sign-in for unknown email");
            return Ok(None);
        };

        if verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            warn!(user_id = user.user_id, "Password mismatch");
            Ok(None)
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Hashes a password into a PHC string.
fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC string.
fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
