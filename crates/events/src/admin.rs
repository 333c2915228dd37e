//! Admin action tracking.
//!
//! The admin tracker in use is picked by the `TRACKING_ADMIN_HANDLER` setting
//! from a registry of factories. [`builtin_admin_handlers`] holds the built-in
//! [`AdminTrackingHandler`]; hosts may register their own factories before
//! resolving.

use std::sync::Arc;

use actionlog_core::error::CoreError;
use actionlog_core::resolver::HandlerRegistry;
use actionlog_core::settings::DEFAULT_ADMIN_HANDLER;
use actionlog_core::types::ActionDetails;
use actionlog_db::models::tracking::TrackingRecord;
use async_trait::async_trait;
use serde_json::Value;

use crate::tracker::{TrackingError, TrackingHandler};

/// Records administrative changes.
#[async_trait]
pub trait AdminTracker: Send + Sync {
    async fn track_admin_action(
        &self,
        action: &str,
        user: &str,
        edited_object: &str,
        description: &str,
        data: Option<Value>,
    ) -> Result<Option<TrackingRecord>, TrackingError>;
}

/// Builds an admin tracker around the generic handler.
pub type AdminHandlerFactory = fn(TrackingHandler) -> Arc<dyn AdminTracker>;

/// Default admin tracker: maps the admin fields onto a details map and
/// tracks it under the default alias.
pub struct AdminTrackingHandler {
    handler: TrackingHandler,
}

impl AdminTrackingHandler {
    pub fn new(handler: TrackingHandler) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl AdminTracker for AdminTrackingHandler {
    async fn track_admin_action(
        &self,
        action: &str,
        user: &str,
        edited_object: &str,
        description: &str,
        data: Option<Value>,
    ) -> Result<Option<TrackingRecord>, TrackingError> {
        let mut details = ActionDetails::new();
        details.insert("actor".into(), Value::String(user.to_string()));
        details.insert("action".into(), Value::String(action.to_string()));
        details.insert("object".into(), Value::String(edited_object.to_string()));
        details.insert("description".into(), Value::String(description.to_string()));
        details.insert("data".into(), data.unwrap_or(Value::Null));

        self.handler.track_action(&details, None).await
    }
}

fn builtin_factory(handler: TrackingHandler) -> Arc<dyn AdminTracker> {
    Arc::new(AdminTrackingHandler::new(handler))
}

/// Registry holding the built-in admin tracker.
pub fn builtin_admin_handlers() -> HandlerRegistry<AdminHandlerFactory> {
    let mut handlers = HandlerRegistry::new();
    handlers
        .register(DEFAULT_ADMIN_HANDLER, builtin_factory as AdminHandlerFactory)
        .expect("built-in handler reference is well-formed");
    handlers
}

/// Resolve the configured admin tracker and build it around `handler`.
pub fn resolve_admin_tracker(
    handlers: &HandlerRegistry<AdminHandlerFactory>,
    handler: TrackingHandler,
) -> Result<Arc<dyn AdminTracker>, CoreError> {
    let factory = handler.resolver().resolve_admin_handler(handlers)?;
    Ok(factory(handler))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::tracker::test_support::handler;

    #[tokio::test]
    async fn admin_fields_map_onto_the_default_alias() {
        let (handler, store) = handler(true);
        let tracker = AdminTrackingHandler::new(handler);

        let record = tracker
            .track_admin_action(
                "admin updated",
                "alice",
                "Widget#42",
                "Changed name.",
                Some(json!([{"model": "catalog.widget", "pk": 42, "fields": {}}])),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.action, "admin updated");
        assert_eq!(record.actor, "alice");
        assert_eq!(record.object, "Widget#42");
        assert_eq!(record.description, "Changed name.");
        assert_eq!(record.target, "");
        assert!(record.data.is_some());
        assert_eq!(store.records("tracking", "audit_actionlog").await.len(), 1);
    }

    #[tokio::test]
    async fn builtin_handler_resolves_by_default() {
        let (handler, store) = handler(true);
        let tracker = resolve_admin_tracker(&builtin_admin_handlers(), handler).unwrap();

        tracker
            .track_admin_action("admin added", "bob", "Widget#1", "", None)
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn unregistered_handler_fails_to_resolve() {
        let (handler, _) = handler(true);
        let err = resolve_admin_tracker(&HandlerRegistry::new(), handler)
            .err()
            .unwrap();
        assert_matches!(err, CoreError::Resolution(_));
    }
}
