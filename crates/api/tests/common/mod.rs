#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use actionlog_api::config::ServerConfig;
use actionlog_api::handlers::tracking::{ActionDetailsCleaner, IdentityCleaner};
use actionlog_api::router::build_app_router;
use actionlog_api::state::AppState;
use actionlog_core::registry::ModelRegistry;
use actionlog_core::resolver::ConfigurationResolver;
use actionlog_core::router::{DatabaseRouter, RouterChain};
use actionlog_core::settings::TrackingSettings;
use actionlog_db::MemoryActionStore;
use actionlog_events::{
    builtin_admin_handlers, resolve_admin_tracker, AdminEventBus, AdminEventListener,
    ListenerPolicy, TrackingHandler,
};

/// Store alias tracking records are routed to in tests.
pub const TRACKING_STORE: &str = "tracking";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: "postgres://localhost/actionlog_test".to_string(),
        tracking_database_url: None,
    }
}

/// Tracking settings with `default`, `orders` and an unset alias.
pub fn test_settings(enabled: bool) -> TrackingSettings {
    TrackingSettings {
        enabled,
        models: BTreeMap::from([
            ("default".to_string(), Some("actionlog.ActionLog".to_string())),
            ("orders".to_string(), Some("shop.OrderAction".to_string())),
            ("unset".to_string(), None),
        ]),
        registered_models: vec![
            "actionlog.ActionLog".to_string(),
            "shop.OrderAction".to_string(),
        ],
        ..TrackingSettings::default()
    }
}

/// A fully wired application over an in-memory action store.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryActionStore>,
}

/// Build the full application router the way `main.rs` does, but over a
/// [`MemoryActionStore`] and with the admin event listener running.
pub fn build_test_app(enabled: bool) -> TestApp {
    build_test_app_with_cleaner(enabled, Arc::new(IdentityCleaner))
}

/// Like [`build_test_app`], with a custom details cleaner installed.
pub fn build_test_app_with_cleaner(
    enabled: bool,
    details_cleaner: Arc<dyn ActionDetailsCleaner>,
) -> TestApp {
    let settings = test_settings(enabled);
    let registry = ModelRegistry::from_references(
        settings.registered_models.iter().map(String::as_str),
    )
    .unwrap();
    let routing = Arc::new(
        RouterChain::new().with_router(DatabaseRouter::new(TRACKING_STORE, &registry)),
    );

    let resolver = Arc::new(ConfigurationResolver::new(
        Arc::new(settings),
        Arc::new(registry),
    ));
    let admin_handlers = builtin_admin_handlers();
    resolver.validate(&admin_handlers).unwrap();

    let store = Arc::new(MemoryActionStore::new(routing));
    let tracking = TrackingHandler::new(resolver, store.clone());

    let event_bus = Arc::new(AdminEventBus::default());
    let tracker = resolve_admin_tracker(&admin_handlers, tracking.clone()).unwrap();
    let listener = AdminEventListener::new(tracker, ListenerPolicy::Isolate);
    tokio::spawn(listener.run(event_bus.subscribe()));

    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        tracking,
        details_cleaner,
        event_bus,
        pools: None,
    };

    TestApp {
        app: build_app_router(state, &config),
        store,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, json.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: impl Into<String>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
