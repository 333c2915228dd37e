//! Read-only handlers over tracked records.

use actionlog_core::error::CoreError;
use actionlog_core::types::DbId;
use actionlog_db::models::tracking::{TrackingQuery, TrackingRecord};
use axum::extract::{Path, Query, State};
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/tracking/records/{alias}
///
/// Newest first, filtered by `search`, paginated by `limit` and `offset`.
pub async fn list_records(
    State(state): State<AppState>,
    Path(alias): Path<String>,
    Query(query): Query<TrackingQuery>,
) -> AppResult<Json<DataResponse<Vec<TrackingRecord>>>> {
    let model = state.tracking.resolver().resolve_model(&alias)?;
    let records = state.tracking.store().list(model, &query).await?;
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/v1/tracking/records/{alias}/{id}
pub async fn get_record(
    State(state): State<AppState>,
    Path((alias, id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<TrackingRecord>>> {
    let model = state.tracking.resolver().resolve_model(&alias)?;
    let record = state
        .tracking
        .store()
        .find(model, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "TrackingRecord",
            id,
        })?;
    Ok(Json(DataResponse { data: record }))
}
