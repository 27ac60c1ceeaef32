//! # Category Repository
//!
//! Database operations for book categories.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bookstore_core::input::CategoryInput;
use bookstore_core::Category;

const COLUMNS: &str = "category_id, name, description";

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM categories ORDER BY name COLLATE NOCASE, category_id"
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    /// Gets a category by id.
    pub async fn get(&self, category_id: i64) -> DbResult<Category> {
        let sql = format!("SELECT {COLUMNS} FROM categories WHERE category_id = ?1");
        sqlx::query_as::<_, Category>(&sql)
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", category_id))
    }

    /// Inserts a new category.
    pub async fn create(&self, input: CategoryInput) -> DbResult<Category> {
        let input = input.validate()?;
        debug!(name = %input.name, "Inserting category");

        let sql = format!(
            "INSERT INTO categories (name, description) VALUES (?1, ?2) RETURNING {COLUMNS}"
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(&self.pool)
            .await?;

        Ok(category)
    }

    /// Overwrites a category's editable fields.
    pub async fn update(&self, category_id: i64, input: CategoryInput) -> DbResult<Category> {
        let input = input.validate()?;
        debug!(category_id, "Updating category");

        let sql = format!(
            "UPDATE categories SET name = ?2, description = ?3 WHERE category_id = ?1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(category_id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", category_id))
    }

    /// Deletes a category.
    ///
    /// ## Returns
    /// * `Err(DbError::InUse)` - books are still filed under it
    pub async fn delete(&self, category_id: i64) -> DbResult<()> {
        debug!(category_id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE category_id = ?1")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).on_delete("category", "it still has books"))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", category_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use bookstore_core::input::BookInput;

    #[tokio::test]
    async fn test_category_crud() {
        let db = memory_db().await;
        let repo = db.categories();

        let fiction = repo
            .create(CategoryInput {
                name: "Fiction".to_string(),
                description: Some("  ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(fiction.description, None);

        let updated = repo
            .update(
                fiction.category_id,
                CategoryInput {
                    name: "Literary Fiction".to_string(),
                    description: Some("Novels".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("Novels"));
        assert_eq!(repo.list().await.unwrap().len(), 1);

        repo.delete(fiction.category_id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_category_with_books_is_in_use() {
        let db = memory_db().await;
        let poetry = db
            .categories()
            .create(CategoryInput { name: "Poetry".to_string(), description: None })
            .await
            .unwrap();
        db.books()
            .create(BookInput {
                title: "Song of Lawino".to_string(),
                author_id: None,
                category_id: Some(poetry.category_id),
                isbn: None,
                stock_quantity: 1,
                price_cents: 900,
            })
            .await
            .unwrap();

        let err = db.categories().delete(poetry.category_id).await.unwrap_err();
        assert!(matches!(err, DbError::InUse { .. }));
    }
}
