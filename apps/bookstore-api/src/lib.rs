//! # Bookstore API
//!
//! HTTP back-office for the bookstore: catalogue, customers, suppliers,
//! orders, purchases, reports and staff sessions.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bookstore API                                    │
//! │                                                                         │
//! │  Client ──► TraceLayer ──► CORS ──► Router                             │
//! │                                       │                                 │
//! │                    ┌──────────────────┼───────────────────┐             │
//! │                    ▼                  ▼                   ▼             │
//! │               /health           /auth/sign-in     everything else      │
//! │               (public)           (public)         AuthenticatedUser    │
//! │                                       │                   │             │
//! │                                       ▼                   ▼             │
//! │                              AppState { db, jwt, config }               │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                              bookstore-db (SQLite)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use bookstore_db::Database;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
        AppState { db, jwt, config }
    }
}

/// State handle cloned into every request.
pub type SharedState = Arc<AppState>;

/// Builds the full application router.
pub fn build_router(state: SharedState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
