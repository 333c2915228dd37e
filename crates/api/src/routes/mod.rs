pub mod admin;
pub mod health;
pub mod tracking;

use axum::Router;

use crate::handlers::tracking::ActionEndpoint;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /tracking/actions                      track under the default alias (POST)
/// /tracking/{alias}/actions              track under a configured alias (POST)
/// /tracking/records/{alias}              list records (GET)
/// /tracking/records/{alias}/{id}         get record (GET)
///
/// /admin/log-entries                     ingest an admin change-log entry (POST)
/// ```
///
/// Alias endpoints are only mounted for the aliases in `endpoints`.
pub fn api_routes(endpoints: Vec<ActionEndpoint>) -> Router<AppState> {
    Router::new()
        .nest("/tracking", tracking::router(endpoints))
        .nest("/admin", admin::router())
}
