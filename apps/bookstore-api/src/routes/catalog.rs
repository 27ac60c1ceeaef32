//! # Catalogue Routes
//!
//! Authors, categories and books.
//!
//! ## Delete Rules
//! ```text
//! DELETE /authors/{id}     → books keep their row, author_id becomes NULL
//! DELETE /categories/{id}  → 409 IN_USE while any book uses it
//! DELETE /books/{id}       → 409 IN_USE once the book has orders or purchases
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;

use crate::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::SharedState;
use bookstore_core::input::{AuthorInput, BookFilter, BookInput, CategoryInput};
use bookstore_core::{Author, Book, BookListing, Category};

// =============================================================================
// Authors
// =============================================================================

pub async fn list_authors(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<Author>>> {
    Ok(Json(state.db.authors().list().await?))
}

pub async fn get_author(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Author>> {
    Ok(Json(state.db.authors().get(id).await?))
}

pub async fn create_author(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Json(input): Json<AuthorInput>,
) -> ApiResult<(StatusCode, Json<Author>)> {
    debug!(name = %input.name, "create_author");
    let author = state.db.authors().create(input).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn update_author(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(input): Json<AuthorInput>,
) -> ApiResult<Json<Author>> {
    debug!(author_id = id, "update_author");
    Ok(Json(state.db.authors().update(id, input).await?))
}

pub async fn delete_author(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.authors().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Categories
// =============================================================================

pub async fn list_categories(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

pub async fn get_category(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.db.categories().get(id).await?))
}

pub async fn create_category(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    debug!(name = %input.name, "create_category");
    let category = state.db.categories().create(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Json<Category>> {
    debug!(category_id = id, "update_category");
    Ok(Json(state.db.categories().update(id, input).await?))
}

pub async fn delete_category(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.categories().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Books
// =============================================================================

/// `GET /books?title=&category_id=&author_id=`
///
/// Title matching is a case-insensitive substring match. Filters combine
/// with AND.
pub async fn list_books(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Query(filter): Query<BookFilter>,
) -> ApiResult<Json<Vec<BookListing>>> {
    let filter = filter.validate()?;
    debug!(?filter, "list_books");
    Ok(Json(state.db.books().list(&filter).await?))
}

pub async fn get_book(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<BookListing>> {
    Ok(Json(state.db.books().get_listing(id).await?))
}

pub async fn create_book(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Json(input): Json<BookInput>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    debug!(title = %input.title, "create_book");
    let book = state.db.books().create(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(input): Json<BookInput>,
) -> ApiResult<Json<Book>> {
    debug!(book_id = id, "update_book");
    Ok(Json(state.db.books().update(id, input).await?))
}

pub async fn delete_book(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.books().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
