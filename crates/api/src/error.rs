use actionlog_core::error::CoreError;
use actionlog_db::StoreError;
use actionlog_events::TrackingError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`StoreError`] for persistence
/// errors. Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `actionlog_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An action store error from `actionlog_db`.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TrackingError> for AppError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::Core(e) => AppError::Core(e),
            TrackingError::Store(e) => AppError::Store(e),
        }
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Store(store) => match store {
                StoreError::Core(core) => classify_core_error(core),
                StoreError::Database(err) => classify_sqlx_error(err),
                StoreError::UnknownStore(alias) => {
                    tracing::error!(store = %alias, "No pool configured for store");
                    internal()
                }
            },
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Map a [`CoreError`] to an HTTP status, error code, and message.
///
/// Alias problems are the caller's to fix, so configuration and resolution
/// failures map to 400 rather than 500.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Configuration(msg) => {
            (StatusCode::BAD_REQUEST, "CONFIGURATION_ERROR", msg.clone())
        }
        CoreError::Resolution(msg) => (StatusCode::BAD_REQUEST, "RESOLUTION_ERROR", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_errors_are_client_errors() {
        let response =
            AppError::Core(CoreError::Configuration("unknown alias".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            AppError::from(TrackingError::Core(CoreError::Resolution("unset".into())))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_store_is_sanitized_500() {
        let response =
            AppError::Store(StoreError::UnknownStore("tracking".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::Core(CoreError::NotFound {
            entity: "TrackingRecord",
            id: 7,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
