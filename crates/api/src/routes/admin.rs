use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted under `/admin`.
pub fn router() -> Router<AppState> {
    Router::new().route("/log-entries", post(admin::ingest_log_entry))
}
