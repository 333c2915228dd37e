use std::sync::Arc;

use actionlog_core::settings::TrackingSettings;
use actionlog_core::types::ActionDetails;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::handlers::records;
use crate::handlers::tracking::{self, ActionEndpoint};
use crate::state::AppState;

/// One endpoint for the default alias plus one per additional configured alias.
pub fn endpoints_for(settings: &TrackingSettings) -> Vec<ActionEndpoint> {
    std::iter::once(ActionEndpoint::default_alias())
        .chain(settings.extra_aliases().map(|alias| ActionEndpoint::for_alias(alias)))
        .collect()
}

/// Routes mounted under `/tracking`.
pub fn router(endpoints: Vec<ActionEndpoint>) -> Router<AppState> {
    let mut router = Router::new()
        .route("/records/{alias}", get(records::list_records))
        .route("/records/{alias}/{id}", get(records::get_record));

    for endpoint in endpoints {
        let path = endpoint.path();
        let endpoint = Arc::new(endpoint);
        router = router.route(
            &path,
            post(
                move |State(state): State<AppState>,
                      payload: Result<Json<ActionDetails>, JsonRejection>| {
                    let endpoint = Arc::clone(&endpoint);
                    async move { tracking::track_action(&state, &endpoint, payload).await }
                },
            ),
        );
    }

    router
}
