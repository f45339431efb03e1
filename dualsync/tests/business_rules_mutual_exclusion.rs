//! Business Rule Tests: Mutual Exclusion
//!
//! These tests verify that only one sync pass runs at a time. A pass issued
//! while another holds the lock must fail immediately instead of waiting.

mod common;

use common::fixtures::*;
use dualsync::{Profile, SyncError, SyncLock};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_pass_rejected_while_push_in_flight() {
    let channel = Arc::new(GatedChannel::new());
    let harness = TestHarness::with_channel(channel.clone()).await;
    let engine = harness.context.engine.clone();

    let push = tokio::spawn({
        let engine = engine.clone();
        async move { engine.sync_from_structured_to_legacy().await }
    });

    // Wait until the push is parked inside the channel call
    channel.entered.notified().await;
    assert!(engine.is_syncing());

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        engine.sync_from_legacy_to_structured(),
    )
    .await
    .expect("a busy lock must fail fast, not wait");

    match result {
        Err(SyncError::SyncInProgress { operation, .. }) => {
            assert_eq!(operation, "structured_to_legacy")
        }
        other => panic!("expected SyncInProgress, got {:?}", other),
    }

    let single = engine.sync_single_profile(&Profile::new("office")).await;
    assert!(matches!(single, Err(SyncError::SyncInProgress { .. })));

    channel.release.notify_one();
    push.await.unwrap().unwrap();
    assert!(!engine.is_syncing());
    assert_eq!(channel.calls(), vec!["legacy.replaceAll".to_string()]);
}

#[tokio::test]
async fn test_bridge_reports_retryable_sync_in_progress() {
    let channel = Arc::new(GatedChannel::new());
    let harness = TestHarness::with_channel(channel.clone()).await;
    let engine = harness.context.engine.clone();

    let push = tokio::spawn(async move { engine.sync_from_structured_to_legacy().await });
    channel.entered.notified().await;

    let response = harness.call("sync", "syncFromLegacy", json!({})).await;
    assert!(!response.success);
    let error = response.error.unwrap();
    assert_eq!(error.code, "sync_in_progress");
    assert_eq!(error.details.unwrap()["retryable"], true);

    let status = harness.call_ok("sync", "getSyncStatus", json!({})).await;
    assert_eq!(status["is_syncing"], true);
    assert_eq!(status["active_operation"]["operation"], "structured_to_legacy");

    channel.release.notify_one();
    push.await.unwrap().unwrap();

    let status = harness.call_ok("sync", "getSyncStatus", json!({})).await;
    assert_eq!(status["is_syncing"], false);
    assert_eq!(status["last_summary"]["direction"], "structured_to_legacy");
}

#[tokio::test]
async fn test_lock_released_after_failed_pass() {
    let harness = TestHarness::new().await;
    harness
        .write_legacy_box("profiles", json!({ "broken": { "isEnabled": true } }))
        .await;

    let engine = &harness.context.engine;
    assert!(engine.sync_from_legacy_to_structured().await.is_err());
    assert!(!engine.is_syncing());

    // Fix the source and the next pass goes through
    harness
        .write_legacy_box(
            "profiles",
            json!({ "home": legacy_profile(profiles::HOME, hosts::RADARR) }),
        )
        .await;
    assert!(engine.sync_from_legacy_to_structured().await.is_ok());
}

#[test]
fn test_lock_is_shared_between_clones() {
    let lock = SyncLock::new();
    let guard = lock.try_acquire("legacy_to_structured").unwrap();
    let other = lock.clone();
    assert!(other.try_acquire("single_profile").is_err());
    drop(guard);
    assert!(other.try_acquire("single_profile").is_ok());
}
