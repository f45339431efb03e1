// File: dualsync/src/services/settings_service.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

use super::finish_unit;
use crate::accessor::StoreAccessor;
use crate::codec::structured::settings_from_structured;
use crate::config::CredentialStore;
use crate::database::{SettingsRecord, StructuredStore};
use crate::errors::{EntityKind, SyncError, SyncResult};
use crate::migration::MigrationCoordinator;
use crate::model::{AppSettings, ServiceKind};

/// The settings singleton as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsView {
    pub id: String,
    #[serde(flatten)]
    pub settings: AppSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SettingsView {
    fn from_record(record: &SettingsRecord) -> SyncResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            settings: settings_from_structured(record)?,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Fields left out are unchanged; collections replace the stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub enabled_profile: Option<String>,
    pub theme_amoled: Option<bool>,
    pub theme_amoled_border: Option<bool>,
    pub theme_image_background_opacity: Option<i64>,
    pub drawer_automatic_manage: Option<bool>,
    pub drawer_manual_order: Option<Vec<String>>,
    pub quick_actions: Option<BTreeMap<ServiceKind, bool>>,
    pub networking_tls_validation: Option<bool>,
    pub use_24_hour_time: Option<bool>,
    pub enable_in_app_notifications: Option<bool>,
    pub changelog_last_build_version: Option<i64>,
}

impl SettingsPatch {
    fn apply(self, settings: &mut AppSettings) {
        if let Some(v) = self.enabled_profile {
            settings.enabled_profile = v;
        }
        if let Some(v) = self.theme_amoled {
            settings.theme_amoled = v;
        }
        if let Some(v) = self.theme_amoled_border {
            settings.theme_amoled_border = v;
        }
        if let Some(v) = self.theme_image_background_opacity {
            settings.theme_image_background_opacity = v;
        }
        if let Some(v) = self.drawer_automatic_manage {
            settings.drawer_automatic_manage = v;
        }
        if let Some(v) = self.drawer_manual_order {
            settings.drawer_manual_order = v;
        }
        if let Some(v) = self.quick_actions {
            settings.quick_actions = v;
        }
        if let Some(v) = self.networking_tls_validation {
            settings.networking_tls_validation = v;
        }
        if let Some(v) = self.use_24_hour_time {
            settings.use_24_hour_time = v;
        }
        if let Some(v) = self.enable_in_app_notifications {
            settings.enable_in_app_notifications = v;
        }
        if let Some(v) = self.changelog_last_build_version {
            settings.changelog_last_build_version = v;
        }
    }
}

pub struct SettingsService {
    structured: Arc<StructuredStore>,
    credentials: Arc<dyn CredentialStore>,
    coordinator: Arc<MigrationCoordinator>,
}

impl SettingsService {
    pub fn new(
        structured: Arc<StructuredStore>,
        credentials: Arc<dyn CredentialStore>,
        coordinator: Arc<MigrationCoordinator>,
    ) -> Self {
        Self {
            structured,
            credentials,
            coordinator,
        }
    }

    /// Read the singleton, creating it with defaults when absent
    pub async fn get(&self) -> SyncResult<SettingsView> {
        if let Some(record) = self.structured.settings_record().await? {
            return SettingsView::from_record(&record);
        }

        let _unit = self.structured.exclusive().await;
        let result = async {
            // Another caller may have created it while we waited
            if self.structured.settings_record().await?.is_none() {
                let mut settings = AppSettings::bootstrap();
                if let Some(active) = self
                    .structured
                    .list_profiles()
                    .await?
                    .into_iter()
                    .find(|stored| stored.profile.is_enabled)
                {
                    settings.enabled_profile = active.profile.name;
                }
                self.structured.write_settings(&settings).await?;
                self.structured.save().await?;
                info!("Created default app settings");
            }
            self.current().await
        }
        .await;

        finish_unit(&self.structured, result).await
    }

    /// `enabled_profile`, when given, must name an existing profile and
    /// makes it the active one.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, patch: SettingsPatch) -> SyncResult<SettingsView> {
        if let Some(opacity) = patch.theme_image_background_opacity {
            if !(0..=100).contains(&opacity) {
                return Err(SyncError::InvalidArguments(format!(
                    "theme_image_background_opacity must be within 0..=100, got {}",
                    opacity
                )));
            }
        }

        let _unit = self.structured.exclusive().await;
        let result = async {
            let mut settings = self
                .structured
                .fetch_settings()
                .await?
                .unwrap_or_else(AppSettings::bootstrap);
            let switch_to = patch.enabled_profile.clone();
            patch.apply(&mut settings);

            if let Some(name) = switch_to {
                if self.structured.find_profile_by_name(&name).await?.is_none() {
                    return Err(SyncError::not_found(EntityKind::Profile, name));
                }
                self.structured.set_single_enabled(&name).await?;
            }

            self.structured.write_settings(&settings).await?;
            self.structured.save().await?;
            self.current().await
        }
        .await;

        finish_unit(&self.structured, result).await
    }

    /// Wipe every structured entity and stored credential, then recreate the
    /// default profile and settings. The migration flag survives.
    #[instrument(skip(self))]
    pub async fn reset_all(&self) -> SyncResult<()> {
        {
            let _unit = self.structured.exclusive().await;
            let result = async {
                self.structured.wipe_entities().await?;
                self.structured.save().await
            }
            .await;
            finish_unit(&self.structured, result).await?;
        }

        self.credentials.delete_all().await.map_err(|e| {
            SyncError::Io(std::io::Error::other(format!(
                "failed to delete credentials: {e:#}"
            )))
        })?;

        self.coordinator.bootstrap_if_needed().await?;
        info!("Reset all data to defaults");
        Ok(())
    }

    async fn current(&self) -> SyncResult<SettingsView> {
        let record = self
            .structured
            .settings_record()
            .await?
            .ok_or(SyncError::NoData {
                entity: EntityKind::AppSettings,
            })?;
        SettingsView::from_record(&record)
    }
}
