//! Migration Integration Tests
//!
//! One-time legacy migration through the bridge and at startup, the
//! completion flag, retry after failure and first-install bootstrap.

mod common;

use common::fixtures::*;
use dualsync::{MigrationState, ServiceKind, StoreAccessor};
use pretty_assertions::assert_eq;
use serde_json::json;

fn radarr_payload() -> serde_json::Value {
    json!({
        "profiles": [
            { "name": "default", "radarrEnabled": true, "radarrHost": "http://r" }
        ]
    })
}

#[tokio::test]
async fn test_migrate_from_legacy_payload() {
    let harness = TestHarness::new().await;

    let migrated = harness
        .call_ok("migration", "migrateFromLegacy", radarr_payload())
        .await;
    assert_eq!(migrated, json!(true));
    assert_eq!(
        harness.call_ok("migration", "isMigrationComplete", json!(null)).await,
        json!(true)
    );
    assert_eq!(
        harness.call_ok("migration", "getMigrationState", json!(null)).await,
        json!("complete")
    );

    let stored = harness.structured.list_profiles().await.unwrap();
    assert_eq!(stored.len(), 1);
    let profile = &stored[0].profile;
    assert_eq!(profile.name, profiles::DEFAULT);
    let radarr = profile.service(ServiceKind::Radarr).unwrap();
    assert!(radarr.enabled);
    assert_eq!(radarr.host, "http://r");

    // The payload had no settings, so bootstrap fills them in
    let settings = harness.structured.fetch_settings().await.unwrap().unwrap();
    assert_eq!(settings.enabled_profile, profiles::DEFAULT);
    assert!(profile.is_enabled);
}

#[tokio::test]
async fn test_second_migration_is_a_no_op() {
    let harness = TestHarness::new().await;
    harness
        .call_ok("migration", "migrateFromLegacy", radarr_payload())
        .await;
    let before = harness.structured.list_profiles().await.unwrap();

    let payload = json!({
        "profiles": [
            { "name": "default", "radarrEnabled": false },
            { "name": "office" }
        ]
    });
    harness
        .call_ok("migration", "migrateFromLegacy", payload)
        .await;

    let after = harness.structured.list_profiles().await.unwrap();
    assert_eq!(after, before);
    assert_eq!(
        harness.call_ok("migration", "getMigrationState", json!(null)).await,
        json!("skipped")
    );
}

#[tokio::test]
async fn test_bad_payload_reports_decode_error() {
    let harness = TestHarness::new().await;

    let response = harness
        .call(
            "migration",
            "migrateFromLegacy",
            json!({ "profiles": [{ "radarrEnabled": true }] }),
        )
        .await;
    assert!(!response.success);
    assert_eq!(response.error_code(), Some("decode_error"));
    assert!(!harness.context.coordinator.is_complete().await.unwrap());
    assert!(harness.structured.list_profiles().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mistyped_payload_reports_invalid_arguments() {
    let harness = TestHarness::new().await;

    let response = harness
        .call("migration", "migrateFromLegacy", json!({ "profiles": "home" }))
        .await;
    assert_eq!(response.error_code(), Some("invalid_arguments"));
}

#[tokio::test]
async fn test_empty_payload_migrates_existing_legacy_store() {
    let harness = TestHarness::new().await;
    harness
        .write_legacy_box(
            "profiles",
            json!({ "home": legacy_profile(profiles::HOME, hosts::RADARR) }),
        )
        .await;

    harness
        .call_ok("migration", "migrateFromLegacy", json!({}))
        .await;

    assert!(harness.context.coordinator.is_complete().await.unwrap());
    let stored = harness.structured.list_profiles().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].profile.name, profiles::HOME);
    assert!(stored[0].profile.is_enabled);
}

#[tokio::test]
async fn test_mark_complete_without_migrating() {
    let harness = TestHarness::new().await;
    harness
        .call_ok("migration", "markMigrationComplete", json!(null))
        .await;
    assert!(harness.context.coordinator.is_complete().await.unwrap());

    // Flag already set, so the payload is ignored
    harness
        .call_ok("migration", "migrateFromLegacy", radarr_payload())
        .await;
    assert!(harness.structured.list_profiles().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_startup_with_empty_legacy_store_bootstraps() {
    let harness = TestHarness::new().await;

    let state = harness.context.coordinator.run_startup().await.unwrap();
    assert_eq!(state, MigrationState::NotStarted);
    assert!(!harness.context.coordinator.is_complete().await.unwrap());

    let stored = harness.structured.list_profiles().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].profile.name, profiles::DEFAULT);
    assert!(stored[0].profile.is_enabled);

    let settings = harness.structured.fetch_settings().await.unwrap().unwrap();
    assert_eq!(settings.enabled_profile, profiles::DEFAULT);

    // Bootstrap only happens once
    assert!(!harness
        .context
        .coordinator
        .bootstrap_if_needed()
        .await
        .unwrap());
}

#[tokio::test]
async fn test_startup_migrates_legacy_data_once() {
    let harness = TestHarness::new().await;
    harness
        .write_legacy_box(
            "profiles",
            json!({ "home": legacy_profile(profiles::HOME, hosts::RADARR) }),
        )
        .await;
    harness
        .write_legacy_box(
            "lunasea",
            json!({ "settings": { "enabledProfile": "home", "themeAMOLED": true } }),
        )
        .await;

    let coordinator = &harness.context.coordinator;
    assert_eq!(coordinator.run_startup().await.unwrap(), MigrationState::Complete);
    assert!(coordinator.is_complete().await.unwrap());

    let stored = harness.structured.list_profiles().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].profile.name, profiles::HOME);
    assert!(stored[0].profile.is_enabled);
    let settings = harness.structured.fetch_settings().await.unwrap().unwrap();
    assert!(settings.theme_amoled);

    assert_eq!(coordinator.run_startup().await.unwrap(), MigrationState::Skipped);
}

#[tokio::test]
async fn test_failed_startup_migration_retries_next_launch() {
    let harness = TestHarness::new().await;
    let mut home = legacy_profile(profiles::HOME, hosts::RADARR);
    home["isEnabled"] = json!(true);
    harness
        .write_legacy_box(
            "profiles",
            json!({
                "home": home,
                "office": legacy_profile(profiles::OFFICE, hosts::RADARR),
            }),
        )
        .await;
    harness
        .write_legacy_box("indexers", json!({ "0": { "displayName": "no host" } }))
        .await;

    let coordinator = &harness.context.coordinator;
    assert_eq!(coordinator.run_startup().await.unwrap(), MigrationState::Failed);
    assert!(!coordinator.is_complete().await.unwrap());
    assert_eq!(coordinator.state().await, MigrationState::Failed);

    // Nothing is left behind, not even bootstrap defaults
    assert!(harness.structured.list_profiles().await.unwrap().is_empty());
    assert!(harness.structured.fetch_settings().await.unwrap().is_none());

    harness
        .write_legacy_box(
            "indexers",
            json!({ "0": legacy_indexer(hosts::INDEXER_A, "A") }),
        )
        .await;
    assert_eq!(coordinator.run_startup().await.unwrap(), MigrationState::Complete);

    let stored: Vec<(String, bool)> = harness
        .structured
        .list_profiles()
        .await
        .unwrap()
        .into_iter()
        .map(|s| (s.profile.name, s.profile.is_enabled))
        .collect();
    assert_eq!(
        stored,
        vec![
            (profiles::HOME.to_string(), true),
            (profiles::OFFICE.to_string(), false),
        ]
    );
    let settings = harness.structured.fetch_settings().await.unwrap().unwrap();
    assert_eq!(settings.enabled_profile, profiles::HOME);
    assert_eq!(harness.structured.list_indexers().await.unwrap().len(), 1);
}
