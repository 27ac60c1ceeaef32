//! # Author Repository
//!
//! Database operations for authors.
//!
//! Deleting an author does not fail when books reference it: the schema
//! sets those books' `author_id` to NULL.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bookstore_core::input::AuthorInput;
use bookstore_core::Author;

/// Repository for author database operations.
#[derive(Debug, Clone)]
pub struct AuthorRepository {
    pool: SqlitePool,
}

impl AuthorRepository {
    /// Creates a new AuthorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuthorRepository { pool }
    }

    /// Lists all authors ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT author_id, name FROM authors ORDER BY name COLLATE NOCASE, author_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    /// Gets an author by id.
    pub async fn get(&self, author_id: i64) -> DbResult<Author> {
        sqlx::query_as::<_, Author>("SELECT author_id, name FROM authors WHERE author_id = ?1")
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Author", author_id))
    }

    /// Inserts a new author.
    ///
    /// ## Returns
    /// * `Ok(Author)` - Inserted author with its new id
    /// * `Err(DbError::SequenceConflict)` - id sequence out of sync
    pub async fn create(&self, input: AuthorInput) -> DbResult<Author> {
        let input = input.validate()?;
        debug!(name = %input.name, "Inserting author");

        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name) VALUES (?1) RETURNING author_id, name",
        )
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(author)
    }

    /// Overwrites an author's editable fields.
    pub async fn update(&self, author_id: i64, input: AuthorInput) -> DbResult<Author> {
        let input = input.validate()?;
        debug!(author_id, "Updating author");

        sqlx::query_as::<_, Author>(
            "UPDATE authors SET name = ?2 WHERE author_id = ?1 RETURNING author_id, name",
        )
        .bind(author_id)
        .bind(&input.name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Author", author_id))
    }

    /// Deletes an author. Books by this author keep existing, unattributed.
    pub async fn delete(&self, author_id: i64) -> DbResult<()> {
        debug!(author_id, "Deleting author");

        let result = sqlx::query("DELETE FROM authors WHERE author_id = ?1")
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Author", author_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
