//! Structured-store representation.
//!
//! The store supplies the row identity (`RecordIdentity`); everything else is
//! derived from the canonical entity. JSON columns that fail to parse are
//! decode errors, never silent defaults.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::database::{
    IndexerRecord, ProfileRecord, RecordIdentity, ServiceRecord, SettingsRecord,
    StructuredProfile,
};
use crate::errors::{EntityKind, SyncError, SyncResult};
use crate::model::{
    AppSettings, Indexer, Profile, ServiceAuth, ServiceCredential, ServiceKind, WakeOnLan,
};

fn to_json<T: serde::Serialize>(value: &T) -> String {
    // Maps of strings and lists of strings always serialize
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn from_json<T: DeserializeOwned>(raw: &str, entity: EntityKind, key: &str) -> SyncResult<T> {
    serde_json::from_str(raw).map_err(|e| SyncError::decode(entity, key, format!("holds invalid JSON: {}", e)))
}

// ============================================================================
// Profile
// ============================================================================

pub fn profile_to_structured(profile: &Profile, identity: &RecordIdentity) -> StructuredProfile {
    let record = ProfileRecord {
        id: identity.id.clone(),
        name: profile.name.clone(),
        is_enabled: profile.is_enabled,
        wol_enabled: profile.wake_on_lan.enabled,
        wol_mac_address: profile.wake_on_lan.mac_address.clone(),
        wol_broadcast_address: profile.wake_on_lan.broadcast_address.clone(),
        created_at: identity.created_at,
        updated_at: identity.updated_at,
    };

    let services = profile
        .services
        .iter()
        .map(|(kind, credential)| {
            let (api_key, username, password) = match &credential.auth {
                ServiceAuth::ApiKey { api_key } => (Some(api_key.clone()), None, None),
                ServiceAuth::Basic { username, password } => {
                    (None, Some(username.clone()), Some(password.clone()))
                }
            };
            ServiceRecord {
                profile_id: identity.id.clone(),
                service: kind.as_str().to_string(),
                enabled: credential.enabled,
                host: credential.host.clone(),
                api_key,
                username,
                password,
                custom_headers: to_json(&credential.custom_headers),
                strict_tls: credential.strict_tls,
            }
        })
        .collect();

    StructuredProfile { record, services }
}

pub fn profile_from_structured(structured: &StructuredProfile) -> SyncResult<Profile> {
    let entity = EntityKind::Profile;
    let record = &structured.record;
    if record.name.trim().is_empty() {
        return Err(SyncError::decode(entity, "name", "is empty"));
    }

    let mut profile = Profile::new(record.name.clone());
    profile.is_enabled = record.is_enabled;
    profile.wake_on_lan = WakeOnLan {
        enabled: record.wol_enabled,
        mac_address: record.wol_mac_address.clone(),
        broadcast_address: record.wol_broadcast_address.clone(),
    };

    for row in &structured.services {
        let kind: ServiceKind = row
            .service
            .parse()
            .map_err(|reason: String| SyncError::decode(entity, "service", reason))?;
        let auth = if kind.uses_basic_auth() {
            ServiceAuth::Basic {
                username: row.username.clone().unwrap_or_default(),
                password: row.password.clone().unwrap_or_default(),
            }
        } else {
            ServiceAuth::ApiKey {
                api_key: row.api_key.clone().unwrap_or_default(),
            }
        };
        let custom_headers: BTreeMap<String, String> = from_json(
            &row.custom_headers,
            entity,
            &format!("{}.custom_headers", kind),
        )?;
        profile.services.insert(
            kind,
            ServiceCredential {
                enabled: row.enabled,
                host: row.host.clone(),
                auth,
                custom_headers,
                strict_tls: row.strict_tls,
            },
        );
    }
    Ok(profile)
}

// ============================================================================
// AppSettings
// ============================================================================

pub fn settings_to_structured(settings: &AppSettings, identity: &RecordIdentity) -> SettingsRecord {
    SettingsRecord {
        id: identity.id.clone(),
        enabled_profile: settings.enabled_profile.clone(),
        theme_amoled: settings.theme_amoled,
        theme_amoled_border: settings.theme_amoled_border,
        theme_image_background_opacity: settings.theme_image_background_opacity,
        drawer_automatic_manage: settings.drawer_automatic_manage,
        drawer_manual_order: to_json(&settings.drawer_manual_order),
        quick_actions: to_json(&settings.quick_actions),
        networking_tls_validation: settings.networking_tls_validation,
        use_24_hour_time: settings.use_24_hour_time,
        enable_in_app_notifications: settings.enable_in_app_notifications,
        changelog_last_build_version: settings.changelog_last_build_version,
        created_at: identity.created_at,
        updated_at: identity.updated_at,
    }
}

pub fn settings_from_structured(record: &SettingsRecord) -> SyncResult<AppSettings> {
    let entity = EntityKind::AppSettings;
    Ok(AppSettings {
        enabled_profile: record.enabled_profile.clone(),
        theme_amoled: record.theme_amoled,
        theme_amoled_border: record.theme_amoled_border,
        theme_image_background_opacity: record.theme_image_background_opacity,
        drawer_automatic_manage: record.drawer_automatic_manage,
        drawer_manual_order: from_json(&record.drawer_manual_order, entity, "drawer_manual_order")?,
        quick_actions: from_json(&record.quick_actions, entity, "quick_actions")?,
        networking_tls_validation: record.networking_tls_validation,
        use_24_hour_time: record.use_24_hour_time,
        enable_in_app_notifications: record.enable_in_app_notifications,
        changelog_last_build_version: record.changelog_last_build_version,
    })
}

// ============================================================================
// Indexer
// ============================================================================

pub fn indexer_to_structured(indexer: &Indexer, identity: &RecordIdentity) -> IndexerRecord {
    IndexerRecord {
        id: identity.id.clone(),
        display_name: indexer.display_name.clone(),
        host: indexer.host.clone(),
        api_key: indexer.api_key.clone(),
        custom_headers: to_json(&indexer.custom_headers),
        created_at: identity.created_at,
        updated_at: identity.updated_at,
    }
}

pub fn indexer_from_structured(record: &IndexerRecord) -> SyncResult<Indexer> {
    let entity = EntityKind::Indexer;
    if record.host.trim().is_empty() {
        return Err(SyncError::decode(entity, "host", "is empty"));
    }
    Ok(Indexer {
        display_name: record.display_name.clone(),
        host: record.host.clone(),
        api_key: record.api_key.clone(),
        custom_headers: from_json(&record.custom_headers, entity, "custom_headers")?,
    })
}
