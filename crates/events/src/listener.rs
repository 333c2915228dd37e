//! Administrative event listener.
//!
//! For every change-log entry the listener classifies the change, snapshots
//! the edited entity as JSON and forwards both to the admin tracker.
//!
//! Tracking failures are isolated by default: they are logged and the entry
//! is dropped, so a failing tracking store never fails the administrative
//! operation that produced the entry. [`ListenerPolicy::Propagate`] restores
//! write-through coupling for hosts that want it.

use std::sync::Arc;
use std::time::Duration;

use actionlog_db::models::tracking::TrackingRecord;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::admin::AdminTracker;
use crate::entry::{AdminLogEntry, ChangeLogEntry};
use crate::tracker::TrackingError;

/// What the listener does with a tracking failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenerPolicy {
    /// Log the failure and report no record.
    #[default]
    Isolate,
    /// Return the failure to the caller.
    Propagate,
}

impl ListenerPolicy {
    pub fn from_propagate_flag(propagate: bool) -> Self {
        if propagate {
            Self::Propagate
        } else {
            Self::Isolate
        }
    }
}

/// Forwards change-log entries to an [`AdminTracker`].
#[derive(Clone)]
pub struct AdminEventListener {
    tracker: Arc<dyn AdminTracker>,
    policy: ListenerPolicy,
}

impl AdminEventListener {
    pub fn new(tracker: Arc<dyn AdminTracker>, policy: ListenerPolicy) -> Self {
        Self { tracker, policy }
    }

    pub fn policy(&self) -> ListenerPolicy {
        self.policy
    }

    /// Handle one entry inline.
    ///
    /// Under [`ListenerPolicy::Isolate`] this never returns an error.
    pub async fn on_log_entry<E>(&self, entry: &E) -> Result<Option<TrackingRecord>, TrackingError>
    where
        E: ChangeLogEntry + ?Sized,
    {
        match self.forward(entry).await {
            Ok(record) => Ok(record),
            Err(e) => match self.policy {
                ListenerPolicy::Isolate => {
                    tracing::error!(
                        error = %e,
                        user = %entry.user(),
                        "Failed to track admin action, continuing",
                    );
                    Ok(None)
                }
                ListenerPolicy::Propagate => Err(e),
            },
        }
    }

    async fn forward<E>(&self, entry: &E) -> Result<Option<TrackingRecord>, TrackingError>
    where
        E: ChangeLogEntry + ?Sized,
    {
        let classification = entry.classification();
        if classification.is_conflicting() {
            tracing::warn!(
                matched = classification.matched,
                action = classification.label(),
                "Log entry matches several action kinds, using the last one",
            );
        }

        let edited_object = entry.edited_object()?;
        let data = match edited_object.to_snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    model = %edited_object.model,
                    "Could not serialize edited object, tracking without data",
                );
                None
            }
        };

        self.tracker
            .track_admin_action(
                classification.label(),
                &entry.user(),
                &edited_object.to_string(),
                entry.change_message(),
                data,
            )
            .await
    }

    /// Consume entries from the bus until it closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<AdminLogEntry>) {
        loop {
            match receiver.recv().await {
                Ok(entry) => {
                    if let Err(e) = self.on_log_entry(&entry).await {
                        tracing::error!(error = %e, "Failed to track admin action");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Admin event listener lagged, some actions were not tracked"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Admin event bus closed, listener shutting down");
                    break;
                }
            }
        }
    }
}

/// Wait for a spawned listener to finish after its bus has been dropped.
///
/// Returns `true` when the listener drained cleanly. A task failure or an
/// expired `timeout` is logged as a warning and returns `false`.
pub async fn await_listener_shutdown(handle: JoinHandle<()>, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(())) => {
            tracing::info!("Admin event listener shut down");
            true
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Admin event listener task failed");
            false
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = timeout.as_secs(),
                "Admin event listener did not drain before the shutdown timeout"
            );
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use actionlog_core::error::CoreError;
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::admin::AdminTrackingHandler;
    use crate::bus::AdminEventBus;
    use crate::entry::{ActionFlag, EditedObject};
    use crate::tracker::test_support::handler;

    fn widget() -> EditedObject {
        EditedObject {
            model: "catalog.widget".into(),
            pk: json!(42),
            display: "Widget#42".into(),
            fields: json!({"name": "Sprocket"}).as_object().cloned().unwrap(),
        }
    }

    fn entry(flag: ActionFlag) -> AdminLogEntry {
        AdminLogEntry {
            action_flag: flag,
            user: "alice".into(),
            change_message: "Changed name.".into(),
            edited_object: Some(widget()),
        }
    }

    /// An entry claiming several kinds at once.
    struct Ambiguous;

    impl ChangeLogEntry for Ambiguous {
        fn is_change(&self) -> bool {
            true
        }
        fn is_deletion(&self) -> bool {
            true
        }
        fn is_addition(&self) -> bool {
            false
        }
        fn user(&self) -> String {
            "alice".into()
        }
        fn edited_object(&self) -> Result<EditedObject, CoreError> {
            Ok(widget())
        }
        fn change_message(&self) -> &str {
            ""
        }
    }

    fn listener(policy: ListenerPolicy) -> (AdminEventListener, Arc<actionlog_db::MemoryActionStore>) {
        let (handler, store) = handler(true);
        let tracker = Arc::new(AdminTrackingHandler::new(handler));
        (AdminEventListener::new(tracker, policy), store)
    }

    #[tokio::test]
    async fn change_entry_is_tracked_as_admin_updated() {
        let (listener, _) = listener(ListenerPolicy::Isolate);

        let record = listener
            .on_log_entry(&entry(ActionFlag::Change))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.action, "admin updated");
        assert_eq!(record.actor, "alice");
        assert_eq!(record.object, "Widget#42");
        assert_eq!(record.description, "Changed name.");
        assert_eq!(
            record.data,
            Some(json!([{"model": "catalog.widget", "pk": 42, "fields": {"name": "Sprocket"}}]))
        );
    }

    #[tokio::test]
    async fn addition_and_deletion_labels() {
        let (listener, _) = listener(ListenerPolicy::Isolate);
        let added = listener.on_log_entry(&entry(ActionFlag::Addition)).await.unwrap().unwrap();
        let deleted = listener.on_log_entry(&entry(ActionFlag::Deletion)).await.unwrap().unwrap();
        assert_eq!(added.action, "admin added");
        assert_eq!(deleted.action, "admin deleted");
    }

    #[tokio::test]
    async fn conflicting_entry_uses_last_matching_kind() {
        let (listener, _) = listener(ListenerPolicy::Isolate);
        let record = listener.on_log_entry(&Ambiguous).await.unwrap().unwrap();
        assert_eq!(record.action, "admin deleted");
    }

    #[tokio::test]
    async fn isolated_failure_is_swallowed() {
        let (listener, store) = listener(ListenerPolicy::Isolate);
        let mut broken = entry(ActionFlag::Change);
        broken.change_message = "x".repeat(300);

        let result = listener.on_log_entry(&broken).await.unwrap();
        assert!(result.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn propagated_failure_reaches_the_caller() {
        let (listener, _) = listener(ListenerPolicy::Propagate);
        let mut broken = entry(ActionFlag::Change);
        broken.edited_object = None;

        let err = listener.on_log_entry(&broken).await.unwrap_err();
        assert_matches!(err, TrackingError::Core(CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn run_tracks_bus_entries_until_closed() {
        let (listener, store) = listener(ListenerPolicy::Isolate);
        let bus = AdminEventBus::default();
        let receiver = bus.subscribe();

        bus.publish(entry(ActionFlag::Addition));
        bus.publish(entry(ActionFlag::Change));
        drop(bus);

        listener.run(receiver).await;
        let actions: Vec<_> = store
            .records("tracking", "audit_actionlog")
            .await
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(actions, vec!["admin added", "admin updated"]);
    }

    #[tokio::test]
    async fn shutdown_reports_clean_drain() {
        let (listener, _) = listener(ListenerPolicy::Isolate);
        let bus = AdminEventBus::default();
        let handle = tokio::spawn(listener.run(bus.subscribe()));
        drop(bus);

        assert!(await_listener_shutdown(handle, Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn shutdown_reports_timeout_and_task_failure() {
        let stuck = tokio::spawn(std::future::pending::<()>());
        assert!(!await_listener_shutdown(stuck, Duration::from_millis(20)).await);

        let failed: JoinHandle<()> = tokio::spawn(async { panic!("listener crashed") });
        assert!(!await_listener_shutdown(failed, Duration::from_secs(5)).await);
    }

    #[test]
    fn policy_from_flag() {
        assert_eq!(ListenerPolicy::from_propagate_flag(false), ListenerPolicy::Isolate);
        assert_eq!(ListenerPolicy::from_propagate_flag(true), ListenerPolicy::Propagate);
    }
}
