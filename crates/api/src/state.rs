use std::sync::Arc;

use actionlog_db::StorePools;
use actionlog_events::{AdminEventBus, TrackingHandler};

use crate::config::ServerConfig;
use crate::handlers::tracking::ActionDetailsCleaner;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Generic tracking handler (resolver + action store).
    pub tracking: TrackingHandler,
    /// Runs on every tracking request body before it is tracked.
    pub details_cleaner: Arc<dyn ActionDetailsCleaner>,
    /// Bus the admin event listener consumes.
    pub event_bus: Arc<AdminEventBus>,
    /// Database pools per store; `None` when running on an in-memory store.
    pub pools: Option<StorePools>,
}
