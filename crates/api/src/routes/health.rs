use std::collections::BTreeMap;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether every configured store is reachable.
    pub db_healthy: bool,
    /// Reachability per store alias.
    pub stores: BTreeMap<String, bool>,
    pub tracking_enabled: bool,
}

/// GET /health -- returns service and per-store database health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut stores = BTreeMap::new();
    if let Some(pools) = &state.pools {
        for (alias, pool) in pools.iter() {
            let healthy = actionlog_db::health_check(pool).await.is_ok();
            stores.insert(alias.to_string(), healthy);
        }
    }

    let db_healthy = stores.values().all(|healthy| *healthy);
    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        stores,
        tracking_enabled: state.tracking.is_enabled(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
