//! Liveness and database status. Public.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: bool,
    pub migrations_applied: usize,
    pub migrations_total: usize,
    pub version: &'static str,
}

/// `GET /health`
///
/// ## When This Returns 503
/// - `SELECT 1` fails (file gone, pool closed)
/// - Migration bookkeeping cannot be read
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthStatus>) {
    let database = state.db.health_check().await;

    let (total, applied) = match state.db.migration_status().await {
        Ok(status) => status,
        Err(e) => {
            warn!(error = %e, "Migration status unavailable");
            (0, 0)
        }
    };

    let healthy = database && total > 0 && applied == total;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthStatus {
            status: if healthy { "ok" } else { "degraded" },
            database,
            migrations_applied: applied,
            migrations_total: total,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
