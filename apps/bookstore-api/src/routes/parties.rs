//! Customers and suppliers.
//!
//! Both refuse deletion (409 `IN_USE`) while orders or purchases point at
//! them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;

use crate::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::SharedState;
use bookstore_core::input::{CustomerInput, SupplierInput};
use bookstore_core::{Customer, Supplier};

// ===== Customers =====

pub async fn list_customers(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list().await?))
}

pub async fn get_customer(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().get(id).await?))
}

pub async fn create_customer(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    debug!(name = %input.name, "create_customer");
    let customer = state.db.customers().create(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<Json<Customer>> {
    debug!(customer_id = id, "update_customer");
    Ok(Json(state.db.customers().update(id, input).await?))
}

pub async fn delete_customer(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.customers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Suppliers =====

pub async fn list_suppliers(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(state.db.suppliers().list().await?))
}

pub async fn get_supplier(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Supplier>> {
    Ok(Json(state.db.suppliers().get(id).await?))
}

pub async fn create_supplier(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Json(input): Json<SupplierInput>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    debug!(name = %input.name, "create_supplier");
    let supplier = state.db.suppliers().create(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(input): Json<SupplierInput>,
) -> ApiResult<Json<Supplier>> {
    debug!(supplier_id = id, "update_supplier");
    Ok(Json(state.db.suppliers().update(id, input).await?))
}

pub async fn delete_supplier(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.suppliers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
