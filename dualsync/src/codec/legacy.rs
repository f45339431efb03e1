//! Legacy key/value representation.
//!
//! Missing optional keys decode to type defaults (`false`, `""`, `0`, empty
//! collections). An optional key holding the wrong primitive type is logged
//! and treated as missing. Only required keys (`name` for profiles, `host`
//! for indexers) fail the decode.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

use crate::errors::{EntityKind, SyncError, SyncResult};
use crate::model::{AppSettings, Indexer, Profile, ServiceAuth, ServiceKind, WakeOnLan};

pub type LegacyMap = Map<String, Value>;

/// Full contents of the legacy store, as exchanged over the bridge and the
/// legacy channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacySnapshot {
    #[serde(default)]
    pub profiles: Vec<LegacyMap>,
    #[serde(default)]
    pub settings: Option<LegacyMap>,
    #[serde(default)]
    pub indexers: Vec<LegacyMap>,
}

impl LegacySnapshot {
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty() && self.settings.is_none() && self.indexers.is_empty()
    }
}

// ============================================================================
// Field readers
// ============================================================================

fn optional<'a>(map: &'a LegacyMap, key: &str) -> Option<&'a Value> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

fn mistyped(entity: EntityKind, key: &str, expected: &str) {
    warn!(
        "Ignoring legacy {} field '{}': expected {}, using default",
        entity, key, expected
    );
}

fn read_bool(map: &LegacyMap, key: &str, entity: EntityKind) -> bool {
    match optional(map, key) {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            mistyped(entity, key, "bool");
            false
        }
    }
}

fn read_string(map: &LegacyMap, key: &str, entity: EntityKind) -> String {
    match optional(map, key) {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            mistyped(entity, key, "string");
            String::new()
        }
    }
}

fn read_int(map: &LegacyMap, key: &str, entity: EntityKind) -> i64 {
    match optional(map, key).map(Value::as_i64) {
        None => 0,
        Some(Some(v)) => v,
        Some(None) => {
            mistyped(entity, key, "integer");
            0
        }
    }
}

fn read_string_map(map: &LegacyMap, key: &str, entity: EntityKind) -> BTreeMap<String, String> {
    match optional(map, key) {
        None => BTreeMap::new(),
        Some(Value::Object(obj)) => {
            let mut headers = BTreeMap::new();
            for (name, value) in obj {
                match value {
                    Value::String(s) => {
                        headers.insert(name.clone(), s.clone());
                    }
                    _ => mistyped(entity, &format!("{}.{}", key, name), "string"),
                }
            }
            headers
        }
        Some(_) => {
            mistyped(entity, key, "object");
            BTreeMap::new()
        }
    }
}

fn read_string_list(map: &LegacyMap, key: &str, entity: EntityKind) -> Vec<String> {
    match optional(map, key) {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                _ => {
                    mistyped(entity, key, "list of strings");
                    None
                }
            })
            .collect(),
        Some(_) => {
            mistyped(entity, key, "list");
            Vec::new()
        }
    }
}

fn require_string(map: &LegacyMap, key: &str, entity: EntityKind) -> SyncResult<String> {
    match map.get(key) {
        None | Some(Value::Null) => Err(SyncError::decode(entity, key, "is missing")),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(SyncError::decode(entity, key, "is empty"))
        }
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SyncError::decode(entity, key, "is not a string")),
    }
}

fn string_map_value(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

fn service_key(kind: ServiceKind, suffix: &str) -> String {
    format!("{}{}", kind.as_str(), suffix)
}

fn quick_action_key(kind: ServiceKind) -> String {
    let name = kind.as_str();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("quickActions{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "quickActions".to_string(),
    }
}

// ============================================================================
// Profile
// ============================================================================

pub fn profile_to_legacy(profile: &Profile) -> LegacyMap {
    let mut map = LegacyMap::new();
    map.insert("name".into(), Value::String(profile.name.clone()));
    map.insert("isEnabled".into(), Value::Bool(profile.is_enabled));

    for (kind, credential) in &profile.services {
        let kind = *kind;
        map.insert(service_key(kind, "Enabled"), Value::Bool(credential.enabled));
        map.insert(service_key(kind, "Host"), Value::String(credential.host.clone()));
        match &credential.auth {
            ServiceAuth::ApiKey { api_key } => {
                map.insert(service_key(kind, "Key"), Value::String(api_key.clone()));
            }
            ServiceAuth::Basic { username, password } => {
                map.insert(service_key(kind, "User"), Value::String(username.clone()));
                map.insert(service_key(kind, "Pass"), Value::String(password.clone()));
            }
        }
        map.insert(
            service_key(kind, "Headers"),
            string_map_value(&credential.custom_headers),
        );
        map.insert(service_key(kind, "StrictTLS"), Value::Bool(credential.strict_tls));
    }

    map.insert(
        "wakeOnLANEnabled".into(),
        Value::Bool(profile.wake_on_lan.enabled),
    );
    map.insert(
        "wakeOnLANMACAddress".into(),
        Value::String(profile.wake_on_lan.mac_address.clone()),
    );
    map.insert(
        "wakeOnLANBroadcastAddress".into(),
        Value::String(profile.wake_on_lan.broadcast_address.clone()),
    );
    map
}

pub fn profile_from_legacy(map: &LegacyMap) -> SyncResult<Profile> {
    let entity = EntityKind::Profile;
    let mut profile = Profile::new(require_string(map, "name", entity)?);
    profile.is_enabled = read_bool(map, "isEnabled", entity);

    for kind in ServiceKind::ALL {
        let credential = profile.service_mut(kind);
        credential.enabled = read_bool(map, &service_key(kind, "Enabled"), entity);
        credential.host = read_string(map, &service_key(kind, "Host"), entity);
        credential.auth = if kind.uses_basic_auth() {
            ServiceAuth::Basic {
                username: read_string(map, &service_key(kind, "User"), entity),
                password: read_string(map, &service_key(kind, "Pass"), entity),
            }
        } else {
            ServiceAuth::ApiKey {
                api_key: read_string(map, &service_key(kind, "Key"), entity),
            }
        };
        credential.custom_headers = read_string_map(map, &service_key(kind, "Headers"), entity);
        credential.strict_tls = read_bool(map, &service_key(kind, "StrictTLS"), entity);
    }

    profile.wake_on_lan = WakeOnLan {
        enabled: read_bool(map, "wakeOnLANEnabled", entity),
        mac_address: read_string(map, "wakeOnLANMACAddress", entity),
        broadcast_address: read_string(map, "wakeOnLANBroadcastAddress", entity),
    };
    Ok(profile)
}

// ============================================================================
// AppSettings
// ============================================================================

pub fn settings_to_legacy(settings: &AppSettings) -> LegacyMap {
    let mut map = LegacyMap::new();
    map.insert(
        "enabledProfile".into(),
        Value::String(settings.enabled_profile.clone()),
    );
    map.insert("themeAMOLED".into(), Value::Bool(settings.theme_amoled));
    map.insert(
        "themeAMOLEDBorder".into(),
        Value::Bool(settings.theme_amoled_border),
    );
    map.insert(
        "themeImageBackgroundOpacity".into(),
        Value::from(settings.theme_image_background_opacity),
    );
    map.insert(
        "drawerAutomaticManage".into(),
        Value::Bool(settings.drawer_automatic_manage),
    );
    map.insert(
        "drawerManualOrder".into(),
        Value::Array(
            settings
                .drawer_manual_order
                .iter()
                .cloned()
                .map(Value::String)
                .collect(),
        ),
    );
    for (kind, enabled) in &settings.quick_actions {
        map.insert(quick_action_key(*kind), Value::Bool(*enabled));
    }
    map.insert(
        "networkingTLSValidation".into(),
        Value::Bool(settings.networking_tls_validation),
    );
    map.insert("use24HourTime".into(), Value::Bool(settings.use_24_hour_time));
    map.insert(
        "enableInAppNotifications".into(),
        Value::Bool(settings.enable_in_app_notifications),
    );
    map.insert(
        "changelogLastBuildVersion".into(),
        Value::from(settings.changelog_last_build_version),
    );
    map
}

pub fn settings_from_legacy(map: &LegacyMap) -> AppSettings {
    let entity = EntityKind::AppSettings;
    let quick_actions = ServiceKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let key = quick_action_key(kind);
            optional(map, &key).map(|_| (kind, read_bool(map, &key, entity)))
        })
        .collect();

    AppSettings {
        enabled_profile: read_string(map, "enabledProfile", entity),
        theme_amoled: read_bool(map, "themeAMOLED", entity),
        theme_amoled_border: read_bool(map, "themeAMOLEDBorder", entity),
        theme_image_background_opacity: read_int(map, "themeImageBackgroundOpacity", entity),
        drawer_automatic_manage: read_bool(map, "drawerAutomaticManage", entity),
        drawer_manual_order: read_string_list(map, "drawerManualOrder", entity),
        quick_actions,
        networking_tls_validation: read_bool(map, "networkingTLSValidation", entity),
        use_24_hour_time: read_bool(map, "use24HourTime", entity),
        enable_in_app_notifications: read_bool(map, "enableInAppNotifications", entity),
        changelog_last_build_version: read_int(map, "changelogLastBuildVersion", entity),
    }
}

// ============================================================================
// Indexer
// ============================================================================

pub fn indexer_to_legacy(indexer: &Indexer) -> LegacyMap {
    let mut map = LegacyMap::new();
    map.insert(
        "displayName".into(),
        Value::String(indexer.display_name.clone()),
    );
    map.insert("host".into(), Value::String(indexer.host.clone()));
    map.insert("apiKey".into(), Value::String(indexer.api_key.clone()));
    map.insert("headers".into(), string_map_value(&indexer.custom_headers));
    map
}

pub fn indexer_from_legacy(map: &LegacyMap) -> SyncResult<Indexer> {
    let entity = EntityKind::Indexer;
    Ok(Indexer {
        host: require_string(map, "host", entity)?,
        display_name: read_string(map, "displayName", entity),
        api_key: read_string(map, "apiKey", entity),
        custom_headers: read_string_map(map, "headers", entity),
    })
}

// ============================================================================
// Snapshot
// ============================================================================

pub fn encode_snapshot(
    profiles: &[Profile],
    settings: Option<&AppSettings>,
    indexers: &[Indexer],
) -> LegacySnapshot {
    LegacySnapshot {
        profiles: profiles.iter().map(profile_to_legacy).collect(),
        settings: settings.map(settings_to_legacy),
        indexers: indexers.iter().map(indexer_to_legacy).collect(),
    }
}

/// Decoded snapshot contents, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedSnapshot {
    pub profiles: Vec<Profile>,
    pub settings: Option<AppSettings>,
    pub indexers: Vec<Indexer>,
}

pub fn decode_snapshot(snapshot: &LegacySnapshot) -> SyncResult<DecodedSnapshot> {
    Ok(DecodedSnapshot {
        profiles: snapshot
            .profiles
            .iter()
            .map(profile_from_legacy)
            .collect::<SyncResult<_>>()?,
        settings: snapshot.settings.as_ref().map(settings_from_legacy),
        indexers: snapshot
            .indexers
            .iter()
            .map(indexer_from_legacy)
            .collect::<SyncResult<_>>()?,
    })
}
