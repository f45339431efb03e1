// File: dualsync/src/services/profile_service.rs
//! Profile CRUD behind the bridge.
//!
//! Rules enforced here:
//! - names are unique
//! - exactly one profile is active once any exist, and `enabled_profile`
//!   in the settings names it
//! - the last remaining profile and the active profile cannot be deleted

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::finish_unit;
use crate::accessor::StoreAccessor;
use crate::config::CredentialStore;
use crate::database::{StoredProfile, StructuredStore};
use crate::errors::{EntityKind, SyncError, SyncResult};
use crate::model::{AppSettings, Profile, ServiceCredential, ServiceKind, WakeOnLan};

/// A stored profile as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub id: String,
    #[serde(flatten)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredProfile> for ProfileView {
    fn from(stored: StoredProfile) -> Self {
        Self {
            id: stored.identity.id,
            profile: stored.profile,
            created_at: stored.identity.created_at,
            updated_at: stored.identity.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProfile {
    pub name: String,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub services: BTreeMap<ServiceKind, ServiceCredential>,
    #[serde(default)]
    pub wake_on_lan: Option<WakeOnLan>,
}

/// Fields left out are unchanged. Listed services replace the stored
/// credential for that service wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub services: BTreeMap<ServiceKind, ServiceCredential>,
    pub wake_on_lan: Option<WakeOnLan>,
}

pub struct ProfileService {
    structured: Arc<StructuredStore>,
    credentials: Arc<dyn CredentialStore>,
}

impl ProfileService {
    pub fn new(structured: Arc<StructuredStore>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            structured,
            credentials,
        }
    }

    pub async fn get_all(&self) -> SyncResult<Vec<ProfileView>> {
        Ok(self
            .structured
            .list_profiles()
            .await?
            .into_iter()
            .map(ProfileView::from)
            .collect())
    }

    pub async fn get_active(&self) -> SyncResult<ProfileView> {
        self.structured
            .list_profiles()
            .await?
            .into_iter()
            .find(|stored| stored.profile.is_enabled)
            .map(ProfileView::from)
            .ok_or_else(|| SyncError::not_found(EntityKind::Profile, "active"))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewProfile) -> SyncResult<ProfileView> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(SyncError::InvalidArguments(
                "profile name must not be empty".to_string(),
            ));
        }

        let _unit = self.structured.exclusive().await;
        let result = async {
            if self.structured.find_profile_by_name(&name).await?.is_some() {
                return Err(SyncError::DuplicateProfile { name: name.clone() });
            }

            let first = self.structured.count_profiles().await? == 0;
            let mut profile = Profile::new(name.clone());
            profile.services.extend(input.services);
            profile.normalize_services();
            if let Some(wake_on_lan) = input.wake_on_lan {
                profile.wake_on_lan = wake_on_lan;
            }
            profile.is_enabled = false;

            self.structured.write_profile(&profile).await?;
            if input.is_enabled || first {
                self.activate(&name).await?;
            }
            self.structured.save().await?;
            self.find_view_by_name(&name).await
        }
        .await;

        let view = finish_unit(&self.structured, result).await?;
        info!("Created profile '{}' ({})", view.profile.name, view.id);
        Ok(view)
    }

    /// Clearing `is_enabled` on the active profile is ignored; activate
    /// another profile instead.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: ProfilePatch) -> SyncResult<ProfileView> {
        let _unit = self.structured.exclusive().await;
        let result = async {
            let stored = self.find_by_id(id).await?;
            let old_name = stored.profile.name.clone();
            let was_active = stored.profile.is_enabled;
            let mut profile = stored.profile;

            if let Some(name) = patch.name {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(SyncError::InvalidArguments(
                        "profile name must not be empty".to_string(),
                    ));
                }
                if name != old_name && self.structured.find_profile_by_name(&name).await?.is_some() {
                    return Err(SyncError::DuplicateProfile { name });
                }
                profile.name = name;
            }
            profile.services.extend(patch.services);
            profile.normalize_services();
            if let Some(wake_on_lan) = patch.wake_on_lan {
                profile.wake_on_lan = wake_on_lan;
            }
            if patch.is_enabled == Some(false) && was_active {
                warn!("Ignoring request to clear the active flag on '{}'", old_name);
            }

            self.structured.write_profile_by_id(id, &profile).await?;
            if patch.is_enabled == Some(true) || (was_active && profile.name != old_name) {
                self.activate(&profile.name).await?;
            }
            self.structured.save().await?;
            self.find_view_by_name(&profile.name).await
        }
        .await;

        finish_unit(&self.structured, result).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> SyncResult<()> {
        let _unit = self.structured.exclusive().await;
        let result = async {
            let stored = self.find_by_id(id).await?;
            if self.structured.count_profiles().await? <= 1 {
                return Err(SyncError::CannotDeleteLastProfile);
            }
            if stored.profile.is_enabled {
                return Err(SyncError::CannotDeleteActiveProfile {
                    name: stored.profile.name,
                });
            }
            self.structured.remove_profile(&stored.profile.name).await?;
            self.structured.save().await?;
            Ok::<_, SyncError>(stored.profile.name)
        }
        .await;

        let name = finish_unit(&self.structured, result).await?;
        info!("Deleted profile '{}'", name);

        if let Err(e) = self.credentials.delete(id).await {
            error!("Failed to delete credentials scoped to profile {}: {}", id, e);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_active(&self, id: &str) -> SyncResult<()> {
        let _unit = self.structured.exclusive().await;
        let result = async {
            let stored = self.find_by_id(id).await?;
            self.activate(&stored.profile.name).await?;
            self.structured.save().await?;
            Ok::<_, SyncError>(stored.profile.name)
        }
        .await;

        let name = finish_unit(&self.structured, result).await?;
        info!("Active profile is now '{}'", name);
        Ok(())
    }

    /// Flag `name` as the only active profile and point the settings at it.
    /// Runs inside the caller's unit of work.
    async fn activate(&self, name: &str) -> SyncResult<()> {
        self.structured.set_single_enabled(name).await?;
        let mut settings = self
            .structured
            .fetch_settings()
            .await?
            .unwrap_or_else(AppSettings::bootstrap);
        settings.enabled_profile = name.to_string();
        self.structured.write_settings(&settings).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> SyncResult<StoredProfile> {
        self.structured
            .find_profile_by_id(id)
            .await?
            .ok_or_else(|| SyncError::not_found(EntityKind::Profile, id))
    }

    async fn find_view_by_name(&self, name: &str) -> SyncResult<ProfileView> {
        self.structured
            .find_profile_by_name(name)
            .await?
            .map(ProfileView::from)
            .ok_or_else(|| SyncError::not_found(EntityKind::Profile, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryCredentialStore;
    use crate::model::ServiceAuth;

    async fn service() -> (Arc<StructuredStore>, Arc<MemoryCredentialStore>, ProfileService) {
        let structured = Arc::new(StructuredStore::open(":memory:").await.unwrap());
        let credentials = Arc::new(MemoryCredentialStore::new());
        let service = ProfileService::new(Arc::clone(&structured), credentials.clone());
        (structured, credentials, service)
    }

    fn named(name: &str) -> NewProfile {
        NewProfile {
            name: name.to_string(),
            ..NewProfile::default()
        }
    }

    #[tokio::test]
    async fn test_first_profile_becomes_active() {
        let (structured, _, service) = service().await;
        let view = service.create(named("home")).await.unwrap();
        assert!(view.profile.is_enabled);

        let settings = structured.fetch_settings().await.unwrap().unwrap();
        assert_eq!(settings.enabled_profile, "home");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let (_, _, service) = service().await;
        service.create(named("home")).await.unwrap();
        let err = service.create(named("home")).await.unwrap_err();
        assert_eq!(err.code(), "duplicate_profile");
        assert_eq!(service.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_keeps_service_credentials() {
        let (_, _, service) = service().await;
        let mut input = named("office");
        input.services.insert(
            ServiceKind::Nzbget,
            ServiceCredential {
                enabled: true,
                host: "http://nzb".to_string(),
                auth: ServiceAuth::Basic {
                    username: "admin".to_string(),
                    password: "hunter2".to_string(),
                },
                custom_headers: BTreeMap::new(),
                strict_tls: true,
            },
        );

        let view = service.create(input).await.unwrap();
        let nzbget = view.profile.service(ServiceKind::Nzbget).unwrap();
        assert_eq!(nzbget.auth.basic(), Some(("admin", "hunter2")));
        assert_eq!(view.profile.services.len(), ServiceKind::ALL.len());
    }

    #[tokio::test]
    async fn test_rename_active_profile_follows_settings() {
        let (structured, _, service) = service().await;
        let view = service.create(named("home")).await.unwrap();

        let patch = ProfilePatch {
            name: Some("house".to_string()),
            ..ProfilePatch::default()
        };
        let updated = service.update(&view.id, patch).await.unwrap();
        assert_eq!(updated.id, view.id);
        assert_eq!(updated.profile.name, "house");

        let settings = structured.fetch_settings().await.unwrap().unwrap();
        assert_eq!(settings.enabled_profile, "house");
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let (_, _, service) = service().await;
        let err = service
            .update("missing", ProfilePatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn test_delete_removes_scoped_credentials() {
        let (_, credentials, service) = service().await;
        service.create(named("home")).await.unwrap();
        let spare = service.create(named("spare")).await.unwrap();
        credentials.save("secret", &spare.id).await.unwrap();
        credentials.save("other", "unrelated").await.unwrap();

        service.delete(&spare.id).await.unwrap();
        assert_eq!(credentials.get(&spare.id).await.unwrap(), None);
        assert_eq!(credentials.len().await, 1);
    }

    #[tokio::test]
    async fn test_cannot_delete_active_profile() {
        let (_, _, service) = service().await;
        let home = service.create(named("home")).await.unwrap();
        service.create(named("spare")).await.unwrap();

        let err = service.delete(&home.id).await.unwrap_err();
        assert_eq!(err.code(), "cannot_delete_active_profile");
        assert_eq!(service.get_all().await.unwrap().len(), 2);
    }
}
