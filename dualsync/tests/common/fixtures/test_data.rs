//! Common test data and constants

use dualsync::codec::LegacyMap;
use dualsync::model::{ServiceAuth, WakeOnLan};
use dualsync::{AppSettings, Indexer, Profile, ServiceKind};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Common profile names
pub mod profiles {
    pub const DEFAULT: &str = "default";
    pub const HOME: &str = "home";
    pub const OFFICE: &str = "office";
}

/// Common service hosts
pub mod hosts {
    pub const RADARR: &str = "http://radarr.local:7878";
    pub const RADARR_MOVED: &str = "http://radarr.lan:7878";
    pub const INDEXER_A: &str = "https://indexer-a.example";
    pub const INDEXER_B: &str = "https://indexer-b.example";
}

pub fn as_map(value: Value) -> LegacyMap {
    value.as_object().cloned().unwrap()
}

/// Legacy profile entry with radarr configured
pub fn legacy_profile(name: &str, radarr_host: &str) -> Value {
    json!({
        "name": name,
        "isEnabled": false,
        "radarrEnabled": true,
        "radarrHost": radarr_host,
        "radarrKey": "radarr-key",
    })
}

pub fn legacy_indexer(host: &str, display_name: &str) -> Value {
    json!({
        "displayName": display_name,
        "host": host,
        "apiKey": "indexer-key",
        "headers": {},
    })
}

/// Profile with every field set to a non-default value
pub fn full_profile(name: &str) -> Profile {
    let mut profile = Profile::new(name);
    profile.is_enabled = true;
    for kind in ServiceKind::ALL {
        let credential = profile.service_mut(kind);
        credential.enabled = true;
        credential.host = format!("http://{}.local", kind);
        credential.auth = if kind.uses_basic_auth() {
            ServiceAuth::Basic {
                username: format!("{}-user", kind),
                password: format!("{}-pass", kind),
            }
        } else {
            ServiceAuth::ApiKey {
                api_key: format!("{}-key", kind),
            }
        };
        credential
            .custom_headers
            .insert("X-Forwarded-User".to_string(), format!("{}-proxy", kind));
        credential.strict_tls = true;
    }
    profile.wake_on_lan = WakeOnLan {
        enabled: true,
        mac_address: "AA:BB:CC:DD:EE:FF".to_string(),
        broadcast_address: "192.168.1.255".to_string(),
    };
    profile
}

pub fn full_settings() -> AppSettings {
    AppSettings {
        enabled_profile: profiles::HOME.to_string(),
        theme_amoled: true,
        theme_amoled_border: true,
        theme_image_background_opacity: 45,
        drawer_automatic_manage: false,
        drawer_manual_order: vec!["radarr".to_string(), "sonarr".to_string()],
        quick_actions: BTreeMap::from([(ServiceKind::Radarr, true), (ServiceKind::Sonarr, false)]),
        networking_tls_validation: true,
        use_24_hour_time: true,
        enable_in_app_notifications: false,
        changelog_last_build_version: 42,
    }
}

pub fn full_indexer(host: &str) -> Indexer {
    Indexer {
        display_name: "Primary".to_string(),
        host: host.to_string(),
        api_key: "indexer-key".to_string(),
        custom_headers: BTreeMap::from([("Authorization".to_string(), "Bearer x".to_string())]),
    }
}
