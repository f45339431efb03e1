use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ServiceKind;
use crate::constants::profiles::DEFAULT_PROFILE_NAME;

/// Global preferences, one record per store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub enabled_profile: String,
    pub theme_amoled: bool,
    pub theme_amoled_border: bool,
    pub theme_image_background_opacity: i64,
    pub drawer_automatic_manage: bool,
    pub drawer_manual_order: Vec<String>,
    pub quick_actions: BTreeMap<ServiceKind, bool>,
    pub networking_tls_validation: bool,
    pub use_24_hour_time: bool,
    pub enable_in_app_notifications: bool,
    pub changelog_last_build_version: i64,
}

impl AppSettings {
    /// Settings written on first install
    pub fn bootstrap() -> Self {
        Self {
            enabled_profile: DEFAULT_PROFILE_NAME.to_string(),
            theme_image_background_opacity: 20,
            drawer_automatic_manage: true,
            enable_in_app_notifications: true,
            ..Self::default()
        }
    }
}
