//! # Order and Purchase Routes
//!
//! Both flows move stock inside one database transaction.
//!
//! ```text
//! POST   /orders        stock -= quantity        (422 if short)
//! PUT    /orders/{id}   stock moves by the delta (old copies count as free)
//! DELETE /orders/{id}   stock += quantity
//! POST   /purchases     stock += quantity per valid line
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, info};

use crate::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::SharedState;
use bookstore_core::input::{OrderInput, PurchaseInput};
use bookstore_core::{OrderSummary, OrderWithDetail, PurchaseSummary, PurchaseWithLines};

// =============================================================================
// Orders
// =============================================================================

pub async fn list_orders(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<OrderSummary>>> {
    Ok(Json(state.db.orders().list().await?))
}

pub async fn get_order(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<OrderWithDetail>> {
    Ok(Json(state.db.orders().get(id).await?))
}

/// `POST /orders`
///
/// ## When This Fails
/// - 404 `NOT_FOUND`: the book does not exist
/// - 422 `INSUFFICIENT_STOCK`: fewer copies than requested; nothing is written
/// - 400 `VALIDATION_ERROR`: blank customer name, quantity outside 1..=10000,
///   unit price above `MAX_PRICE_CENTS`
pub async fn create_order(
    auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Json(input): Json<OrderInput>,
) -> ApiResult<(StatusCode, Json<OrderWithDetail>)> {
    debug!(
        book_id = input.book_id,
        quantity = input.quantity,
        user_id = auth.user.user_id,
        "create_order"
    );
    let order = state.db.orders().create(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_order(
    auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(input): Json<OrderInput>,
) -> ApiResult<Json<OrderWithDetail>> {
    debug!(order_id = id, user_id = auth.user.user_id, "update_order");
    Ok(Json(state.db.orders().update(id, input).await?))
}

pub async fn delete_order(
    auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.orders().delete(id).await?;
    info!(order_id = id, user_id = auth.user.user_id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Purchases
// =============================================================================

pub async fn list_purchases(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<PurchaseSummary>>> {
    Ok(Json(state.db.purchases().list().await?))
}

pub async fn get_purchase(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PurchaseWithLines>> {
    Ok(Json(state.db.purchases().get(id).await?))
}

/// `POST /purchases`
///
/// Lines missing a book, quantity or cost are dropped. If none remain the
/// request fails with 400 and nothing is written.
pub async fn create_purchase(
    auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Json(input): Json<PurchaseInput>,
) -> ApiResult<(StatusCode, Json<PurchaseWithLines>)> {
    debug!(
        supplier_id = ?input.supplier_id,
        lines = input.lines.len(),
        user_id = auth.user.user_id,
        "create_purchase"
    );
    let purchase = state.db.purchases().create(&input).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}
