use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actionlog_core::registry::ModelRegistry;
use actionlog_core::resolver::ConfigurationResolver;
use actionlog_core::router::{DatabaseRouter, RouterChain};
use actionlog_core::settings::TrackingSettings;
use actionlog_db::{PgActionStore, StorePools};
use actionlog_events::{
    await_listener_shutdown, builtin_admin_handlers, resolve_admin_tracker, AdminEventBus,
    AdminEventListener, ListenerPolicy, TrackingHandler,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use actionlog_api::config::ServerConfig;
use actionlog_api::handlers::tracking::IdentityCleaner;
use actionlog_api::router::build_app_router;
use actionlog_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "actionlog_api=debug,actionlog_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let settings = TrackingSettings::from_env().expect("Invalid tracking settings");
    tracing::info!(
        enabled = settings.enabled,
        aliases = settings.models.len(),
        store = %settings.database_alias,
        "Loaded tracking settings"
    );

    // --- Record types and routing ---
    let registry = ModelRegistry::from_references(
        settings.registered_models.iter().map(String::as_str),
    )
    .expect("Invalid registered tracking models");

    let routing = Arc::new(
        RouterChain::new().with_router(DatabaseRouter::new(&settings.database_alias, &registry)),
    );

    // --- Database ---
    let default_pool = actionlog_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let tracking_pool = match &config.tracking_database_url {
        Some(url) => Some(
            actionlog_db::create_pool(url)
                .await
                .expect("Failed to connect to tracking database"),
        ),
        None => None,
    };

    let pools = StorePools::for_tracking(default_pool, &settings.database_alias, tracking_pool)
        .expect("Invalid tracking store configuration");
    for (alias, pool) in pools.iter() {
        actionlog_db::health_check(pool)
            .await
            .unwrap_or_else(|e| panic!("Database health check failed for store '{alias}': {e}"));
    }
    tracing::info!("Database connection pools created");

    let tables = actionlog_db::schema::sync_tracking_tables(&pools, &routing, &registry)
        .await
        .expect("Failed to create tracking tables");
    tracing::info!(tables, "Tracking tables synchronized");

    // --- Tracking ---
    let resolver = Arc::new(ConfigurationResolver::new(
        Arc::new(settings),
        Arc::new(registry),
    ));
    let admin_handlers = builtin_admin_handlers();
    resolver
        .validate(&admin_handlers)
        .expect("Invalid tracking configuration");

    let store = Arc::new(PgActionStore::new(pools.clone(), Arc::clone(&routing)));
    let tracking = TrackingHandler::new(Arc::clone(&resolver), store);

    // --- Admin event listener ---
    let event_bus = Arc::new(AdminEventBus::default());
    let admin_tracker = resolve_admin_tracker(&admin_handlers, tracking.clone())
        .expect("Failed to resolve admin tracking handler");
    let policy = ListenerPolicy::from_propagate_flag(resolver.settings().propagate_listener_errors);
    let listener = AdminEventListener::new(admin_tracker, policy);
    let listener_handle = tokio::spawn(listener.run(event_bus.subscribe()));
    tracing::info!(?policy, "Admin event listener started");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        tracking,
        details_cleaner: Arc::new(IdentityCleaner),
        event_bus: Arc::clone(&event_bus),
        pools: Some(pools),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Dropping the last bus handle closes the channel, which stops the listener
    // once it has drained queued entries.
    drop(event_bus);
    await_listener_shutdown(
        listener_handle,
        Duration::from_secs(config.shutdown_timeout_secs),
    )
    .await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
