//! Web Handler Integration Tests
//!
//! The HTTP router in front of the bridge: status codes per error code and
//! the status endpoint.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::fixtures::*;
use dualsync::web::{create_router, AppState};
use dualsync::AppConfig;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn router(harness: &TestHarness) -> Router {
    let context = &harness.context;
    create_router(AppState::new(
        Arc::new(AppConfig::default()),
        context.bridge.clone(),
        context.engine.clone(),
        context.coordinator.clone(),
    ))
}

async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(&value).unwrap()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_bridge_endpoint_success() {
    let harness = TestHarness::new().await;
    harness.context.coordinator.run_startup().await.unwrap();

    let (status, body) = send(
        router(&harness),
        Method::POST,
        "/api/bridge",
        Some(json!({ "service": "profile", "action": "getAllProfiles" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"][0]["name"], json!(profiles::DEFAULT));
}

#[tokio::test]
async fn test_path_endpoint_without_body() {
    let harness = TestHarness::new().await;

    let (status, body) = send(
        router(&harness),
        Method::POST,
        "/api/migration/isMigrationComplete",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!(false));
}

#[tokio::test]
async fn test_error_codes_map_to_status() {
    let harness = TestHarness::new().await;
    harness.context.coordinator.run_startup().await.unwrap();

    let cases = [
        ("/api/media/getAllProfiles", json!({}), StatusCode::BAD_REQUEST, "unknown_service"),
        ("/api/profile/explode", json!({}), StatusCode::BAD_REQUEST, "unknown_action"),
        ("/api/profile/deleteProfile", json!({}), StatusCode::BAD_REQUEST, "invalid_arguments"),
        ("/api/profile/deleteProfile", json!({ "id": "missing" }), StatusCode::NOT_FOUND, "not_found"),
        (
            "/api/profile/createProfile",
            json!({ "name": profiles::DEFAULT }),
            StatusCode::CONFLICT,
            "duplicate_profile",
        ),
    ];

    for (uri, arguments, expected_status, expected_code) in cases {
        let (status, body) = send(router(&harness), Method::POST, uri, Some(arguments)).await;
        assert_eq!(status, expected_status, "{}", uri);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["code"], json!(expected_code), "{}", uri);
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_arguments() {
    let harness = TestHarness::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/profile/createProfile")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router(&harness).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], json!("invalid_arguments"));
}

#[tokio::test]
async fn test_status_endpoint() {
    let harness = TestHarness::new().await;
    harness.context.coordinator.run_startup().await.unwrap();

    let (status, body) = send(router(&harness), Method::GET, "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["migration_state"], json!("not_started"));
    assert_eq!(body["data"]["sync"]["is_syncing"], json!(false));
}
