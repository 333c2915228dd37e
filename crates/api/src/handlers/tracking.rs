//! Handler for the action tracking POST endpoint.
//!
//! Each endpoint is bound to one model alias at startup (see
//! [`ActionEndpoint`]). The response shape is fixed: success returns
//! `201 {message, action_log_id, action_details}` and every failure returns
//! `400 {message, action_details}` echoing the submitted details.

use actionlog_core::error::CoreError;
use actionlog_core::settings::DEFAULT_ALIAS;
use actionlog_core::types::{ActionDetails, DbId};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

pub const SUCCESS_MESSAGE: &str = "Tracking action succeeded";
pub const FAILURE_MESSAGE: &str = "Tracking action failed";

// ---------------------------------------------------------------------------
// Details cleaning
// ---------------------------------------------------------------------------

/// Hook run on the request body before it reaches the tracking handler.
///
/// Installed through [`AppState::details_cleaner`]. Implementations may
/// rewrite or reject the details; a rejection is reported with the failure
/// shape and nothing is written.
pub trait ActionDetailsCleaner: Send + Sync {
    fn clean(&self, details: ActionDetails) -> Result<ActionDetails, CoreError>;
}

/// Passes details through unchanged.
pub struct IdentityCleaner;

impl ActionDetailsCleaner for IdentityCleaner {
    fn clean(&self, details: ActionDetails) -> Result<ActionDetails, CoreError> {
        Ok(details)
    }
}

// ---------------------------------------------------------------------------
// Endpoint binding
// ---------------------------------------------------------------------------

/// A tracking endpoint bound to one model alias.
#[derive(Debug, Clone)]
pub struct ActionEndpoint {
    alias: Option<String>,
}

impl ActionEndpoint {
    /// Endpoint for the default alias.
    pub fn default_alias() -> Self {
        Self { alias: None }
    }

    pub fn for_alias(alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
        }
    }

    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(DEFAULT_ALIAS)
    }

    /// Route path relative to `/api/v1/tracking`.
    pub fn path(&self) -> String {
        match &self.alias {
            None => "/actions".to_string(),
            Some(alias) => format!("/{alias}/actions"),
        }
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TrackingSuccess {
    pub message: &'static str,
    pub action_log_id: DbId,
    pub action_details: ActionDetails,
}

#[derive(Debug, Serialize)]
pub struct TrackingFailure {
    pub message: String,
    pub action_details: ActionDetails,
}

fn failure(message: impl Into<String>, action_details: ActionDetails) -> Response {
    let body = TrackingFailure {
        message: message.into(),
        action_details,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// POST /api/v1/tracking/actions and /api/v1/tracking/{alias}/actions
///
/// Empty details are rejected before the tracking handler runs, so a failed
/// request never leaves a record behind.
pub async fn track_action(
    state: &AppState,
    endpoint: &ActionEndpoint,
    payload: Result<Json<ActionDetails>, JsonRejection>,
) -> Response {
    let details = match payload {
        Ok(Json(details)) => details,
        Err(rejection) => {
            tracing::warn!(alias = endpoint.alias(), error = %rejection, "Malformed tracking request");
            return failure(rejection.body_text(), ActionDetails::new());
        }
    };

    let details = match state.details_cleaner.clean(details.clone()) {
        Ok(cleaned) => cleaned,
        Err(e) => {
            tracing::warn!(alias = endpoint.alias(), error = %e, "Action details rejected");
            return failure(e.to_string(), details);
        }
    };

    if details.is_empty() {
        return failure(FAILURE_MESSAGE, details);
    }

    match state
        .tracking
        .track_action(&details, endpoint.alias.as_deref())
        .await
    {
        Ok(Some(record)) => {
            let body = TrackingSuccess {
                message: SUCCESS_MESSAGE,
                action_log_id: record.id,
                action_details: details,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Ok(None) => failure(FAILURE_MESSAGE, details),
        Err(e) => {
            tracing::warn!(alias = endpoint.alias(), error = %e, "Tracking action failed");
            failure(e.to_string(), details)
        }
    }
}
