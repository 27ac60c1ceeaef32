//! # Routes
//!
//! ```text
//! routes/
//! ├── mod.rs      ◄─── You are here (router assembly)
//! ├── health.rs   ◄─── /health (public)
//! ├── catalog.rs  ◄─── /authors, /categories, /books
//! ├── parties.rs  ◄─── /customers, /suppliers
//! ├── orders.rs   ◄─── /orders, /purchases
//! └── reports.rs  ◄─── /reports, /reports/export, /dashboard
//! ```
//!
//! Every handler except `/health` and `/auth/sign-in` takes an
//! [`AuthenticatedUser`](crate::auth::AuthenticatedUser), so a request
//! without a live session gets 401 before the handler body runs.

pub mod catalog;
pub mod health;
pub mod orders;
pub mod parties;
pub mod reports;

use axum::routing::{get, post};
use axum::Router;

use crate::auth;
use crate::SharedState;

/// All routes, without middleware or state.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health::health))
        // Session
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/auth/session", get(auth::session))
        // Catalogue
        .route(
            "/authors",
            get(catalog::list_authors).post(catalog::create_author),
        )
        .route(
            "/authors/{id}",
            get(catalog::get_author)
                .put(catalog::update_author)
                .delete(catalog::delete_author),
        )
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/categories/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route("/books", get(catalog::list_books).post(catalog::create_book))
        .route(
            "/books/{id}",
            get(catalog::get_book)
                .put(catalog::update_book)
                .delete(catalog::delete_book),
        )
        // Parties
        .route(
            "/customers",
            get(parties::list_customers).post(parties::create_customer),
        )
        .route(
            "/customers/{id}",
            get(parties::get_customer)
                .put(parties::update_customer)
                .delete(parties::delete_customer),
        )
        .route(
            "/suppliers",
            get(parties::list_suppliers).post(parties::create_supplier),
        )
        .route(
            "/suppliers/{id}",
            get(parties::get_supplier)
                .put(parties::update_supplier)
                .delete(parties::delete_supplier),
        )
        // Stock-moving flows
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route(
            "/orders/{id}",
            get(orders::get_order)
                .put(orders::update_order)
                .delete(orders::delete_order),
        )
        .route(
            "/purchases",
            get(orders::list_purchases).post(orders::create_purchase),
        )
        .route("/purchases/{id}", get(orders::get_purchase))
        // Reporting
        .route("/reports", get(reports::get_report))
        .route("/reports/export", get(reports::export))
        .route("/dashboard", get(reports::dashboard))
}

// =============================================================================
// Router Tests
// =============================================================================
