//! HTTP-level integration tests for administrative log-entry ingestion.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, build_test_app, post_json, TRACKING_STORE};
use serde_json::json;

const DEFAULT_TABLE: &str = "actionlog_actionlog";

/// Wait until the listener has written `count` records.
async fn wait_for_records(store: &actionlog_db::MemoryActionStore, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while store.len().await < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("listener did not track the entry in time");
}

#[tokio::test]
async fn change_entry_is_tracked_by_the_listener() {
    let test = build_test_app(true);
    let response = post_json(
        test.app,
        "/api/v1/admin/log-entries",
        json!({
            "action_flag": "change",
            "user": "alice",
            "change_message": "Changed name.",
            "edited_object": {
                "model": "catalog.widget",
                "pk": 42,
                "display": "Widget#42",
                "fields": {"name": "Sprocket"},
            },
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await["data"]["delivered"], 1);

    wait_for_records(&test.store, 1).await;
    let records = test.store.records(TRACKING_STORE, DEFAULT_TABLE).await;
    assert_eq!(records[0].action, "admin updated");
    assert_eq!(records[0].actor, "alice");
    assert_eq!(records[0].object, "Widget#42");
    assert_eq!(records[0].description, "Changed name.");
    assert_eq!(
        records[0].data,
        Some(json!([{"model": "catalog.widget", "pk": 42, "fields": {"name": "Sprocket"}}]))
    );
}

#[tokio::test]
async fn failed_entry_does_not_fail_ingestion() {
    let test = build_test_app(true);

    // No edited object: the listener logs and drops it.
    let response = post_json(
        test.app.clone(),
        "/api/v1/admin/log-entries",
        json!({"action_flag": "deletion", "user": "alice"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = post_json(
        test.app,
        "/api/v1/admin/log-entries",
        json!({
            "action_flag": "addition",
            "user": "bob",
            "edited_object": {"model": "catalog.widget", "pk": 1, "display": "Widget#1"},
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    wait_for_records(&test.store, 1).await;
    let records = test.store.records(TRACKING_STORE, DEFAULT_TABLE).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "admin added");
}

#[tokio::test]
async fn malformed_entry_is_rejected() {
    let test = build_test_app(true);
    let response = post_json(
        test.app,
        "/api/v1/admin/log-entries",
        json!({"action_flag": "rename", "user": "alice"}),
    )
    .await;
    assert!(response.status().is_client_error());
}
