//! Handler for administrative change-log ingestion.
//!
//! Entries are published to the admin event bus and tracked asynchronously
//! by the admin event listener, so the response never reflects a tracking
//! failure.

use actionlog_events::AdminLogEntry;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IngestResult {
    /// Number of listeners the entry was delivered to.
    pub delivered: usize,
}

/// POST /api/v1/admin/log-entries
pub async fn ingest_log_entry(
    State(state): State<AppState>,
    Json(entry): Json<AdminLogEntry>,
) -> (StatusCode, Json<DataResponse<IngestResult>>) {
    let delivered = state.event_bus.publish(entry);
    if delivered == 0 {
        tracing::warn!("No admin event listener subscribed, log entry dropped");
    }

    (
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: IngestResult { delivered },
        }),
    )
}
