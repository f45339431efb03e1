//! Bridge Integration Tests
//!
//! Request routing, error codes and response shapes of the bridge façade.

mod common;

use common::fixtures::*;
use dualsync::StoreAccessor;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case("media", "getAllProfiles", "unknown_service")]
#[case("", "getAllProfiles", "unknown_service")]
#[case("profile", "getEverything", "unknown_action")]
#[case("settings", "getAllProfiles", "unknown_action")]
#[case("migration", "rollback", "unknown_action")]
#[case("sync", "syncEverything", "unknown_action")]
#[tokio::test]
async fn test_unknown_routes_are_rejected(
    #[case] service: &str,
    #[case] action: &str,
    #[case] code: &str,
) {
    let harness = TestHarness::new().await;

    let response = harness.call(service, action, json!(null)).await;
    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(response.error_code(), Some(code));

    // Nothing was touched
    assert!(harness.structured.list_profiles().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_required_argument() {
    let harness = TestHarness::new().await;

    let response = harness.call("profile", "deleteProfile", json!(null)).await;
    assert_eq!(response.error_code(), Some("invalid_arguments"));

    let response = harness
        .call("profile", "createProfile", json!({ "is_enabled": true }))
        .await;
    assert_eq!(response.error_code(), Some("invalid_arguments"));
}

#[tokio::test]
async fn test_create_and_list_profiles() {
    let harness = TestHarness::new().await;

    let created = harness
        .call_ok(
            "profile",
            "createProfile",
            json!({
                "name": "home",
                "services": {
                    "radarr": {
                        "enabled": true,
                        "host": hosts::RADARR,
                        "auth": { "type": "api_key", "api_key": "abc" },
                        "strict_tls": true
                    }
                }
            }),
        )
        .await;
    assert_eq!(created["name"], json!("home"));
    assert!(created["id"].as_str().is_some_and(|id| !id.is_empty()));
    // The only profile becomes the active one
    assert_eq!(created["is_enabled"], json!(true));
    assert_eq!(created["services"]["radarr"]["host"], json!(hosts::RADARR));
    assert_eq!(created["services"]["sonarr"]["enabled"], json!(false));

    let all = harness
        .call_ok("profile", "getAllProfiles", json!(null))
        .await;
    assert_eq!(all.as_array().map(Vec::len), Some(1));

    let active = harness
        .call_ok("profile", "getActiveProfile", json!(null))
        .await;
    assert_eq!(active["id"], created["id"]);
}

#[tokio::test]
async fn test_get_settings_creates_defaults_once() {
    let harness = TestHarness::new().await;

    let first = harness
        .call_ok("settings", "getAppSettings", json!(null))
        .await;
    let second = harness
        .call_ok("settings", "getAppSettings", json!(null))
        .await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["theme_image_background_opacity"], json!(20));
    assert_eq!(harness.structured.count_settings().await.unwrap(), 1);
}

#[tokio::test]
async fn test_sync_profile_requires_existing_name() {
    let harness = TestHarness::new().await;

    let response = harness
        .call("sync", "syncProfile", json!({ "name": "ghost" }))
        .await;
    assert_eq!(response.error_code(), Some("not_found"));
    let error = response.error.unwrap();
    assert_eq!(error.details.unwrap()["key"], json!("ghost"));
}

#[tokio::test]
async fn test_sync_to_legacy_and_status() {
    let harness = TestHarness::new().await;
    harness.context.coordinator.run_startup().await.unwrap();

    let summary = harness.call_ok("sync", "syncToLegacy", json!(null)).await;
    assert_eq!(summary["direction"], json!("structured_to_legacy"));
    assert_eq!(summary["settings_synced"], json!(true));

    let legacy_profiles = harness.legacy.fetch_profiles().await.unwrap();
    assert_eq!(legacy_profiles.len(), 1);
    assert_eq!(legacy_profiles[0].name, profiles::DEFAULT);

    let status = harness.call_ok("sync", "getSyncStatus", json!(null)).await;
    assert_eq!(status["is_syncing"], json!(false));
    assert!(status["active_operation"].is_null());
    assert_eq!(
        status["last_summary"]["direction"],
        json!("structured_to_legacy")
    );
}

#[tokio::test]
async fn test_sync_from_legacy_reports_counts() {
    let harness = TestHarness::new().await;
    harness
        .write_legacy_box(
            "profiles",
            json!({ "home": legacy_profile(profiles::HOME, hosts::RADARR) }),
        )
        .await;

    let summary = harness
        .call_ok("sync", "syncFromLegacy", json!({}))
        .await;
    assert_eq!(summary["direction"], json!("legacy_to_structured"));
    assert_eq!(summary["profiles_created"], json!(1));
    assert_eq!(summary["indexers_created"], json!(0));
}
