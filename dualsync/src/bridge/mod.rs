// File: dualsync/src/bridge/mod.rs
//! Single entry point for every outside caller.
//!
//! Requests name a `(service, action)` pair plus JSON arguments. Arguments
//! are decoded into typed structs before anything runs, and every outcome,
//! success or failure, is returned as a `BridgeResponse`. No `SyncError`
//! crosses this boundary.

mod args;
mod response;

pub use args::{IdArgs, NameArgs, UpdateProfileArgs};
pub use response::{BridgeError, BridgeResponse};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::codec::LegacySnapshot;
use crate::errors::{EntityKind, SyncError, SyncResult};
use crate::migration::MigrationCoordinator;
use crate::services::{NewProfile, ProfileService, SettingsPatch, SettingsService};
use crate::sync::SyncEngine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    pub service: String,
    pub action: String,
    #[serde(default)]
    pub arguments: Value,
}

impl BridgeRequest {
    pub fn new(service: &str, action: &str, arguments: Value) -> Self {
        Self {
            service: service.to_string(),
            action: action.to_string(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeService {
    Profile,
    Settings,
    Migration,
    Sync,
}

impl FromStr for BridgeService {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(BridgeService::Profile),
            "settings" => Ok(BridgeService::Settings),
            "migration" => Ok(BridgeService::Migration),
            "sync" => Ok(BridgeService::Sync),
            other => Err(SyncError::UnknownService(other.to_string())),
        }
    }
}

impl fmt::Display for BridgeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BridgeService::Profile => "profile",
            BridgeService::Settings => "settings",
            BridgeService::Migration => "migration",
            BridgeService::Sync => "sync",
        };
        f.write_str(name)
    }
}

pub struct Bridge {
    profiles: Arc<ProfileService>,
    settings: Arc<SettingsService>,
    coordinator: Arc<MigrationCoordinator>,
    engine: Arc<SyncEngine>,
}

impl Bridge {
    pub fn new(
        profiles: Arc<ProfileService>,
        settings: Arc<SettingsService>,
        coordinator: Arc<MigrationCoordinator>,
        engine: Arc<SyncEngine>,
    ) -> Self {
        Self {
            profiles,
            settings,
            coordinator,
            engine,
        }
    }

    #[instrument(skip(self, request), fields(service = %request.service, action = %request.action))]
    pub async fn handle(&self, request: BridgeRequest) -> BridgeResponse {
        match self.dispatch(&request).await {
            Ok(data) => BridgeResponse::ok(data),
            Err(e) => {
                warn!("{}.{} failed: {}", request.service, request.action, e);
                BridgeResponse::err(&e)
            }
        }
    }

    async fn dispatch(&self, request: &BridgeRequest) -> SyncResult<Value> {
        let service: BridgeService = request.service.parse()?;
        debug!("Dispatching {}.{}", service, request.action);

        match service {
            BridgeService::Profile => self.profile_action(&request.action, &request.arguments).await,
            BridgeService::Settings => self.settings_action(&request.action, &request.arguments).await,
            BridgeService::Migration => {
                self.migration_action(&request.action, &request.arguments).await
            }
            BridgeService::Sync => self.sync_action(&request.action, &request.arguments).await,
        }
    }

    async fn profile_action(&self, action: &str, args: &Value) -> SyncResult<Value> {
        match action {
            "getAllProfiles" => to_data(&self.profiles.get_all().await?),
            "getActiveProfile" => to_data(&self.profiles.get_active().await?),
            "createProfile" => {
                let input: NewProfile = parse_args(args)?;
                to_data(&self.profiles.create(input).await?)
            }
            "updateProfile" => {
                let UpdateProfileArgs { id, patch } = parse_args(args)?;
                to_data(&self.profiles.update(&id, patch).await?)
            }
            "deleteProfile" => {
                let IdArgs { id } = parse_args(args)?;
                self.profiles.delete(&id).await?;
                Ok(json!(true))
            }
            "setActiveProfile" => {
                let IdArgs { id } = parse_args(args)?;
                self.profiles.set_active(&id).await?;
                Ok(json!(true))
            }
            other => Err(unknown_action(BridgeService::Profile, other)),
        }
    }

    async fn settings_action(&self, action: &str, args: &Value) -> SyncResult<Value> {
        match action {
            "getAppSettings" => to_data(&self.settings.get().await?),
            "updateAppSettings" => {
                let patch: SettingsPatch = parse_args(args)?;
                to_data(&self.settings.update(patch).await?)
            }
            "resetAll" => {
                self.settings.reset_all().await?;
                Ok(json!(true))
            }
            other => Err(unknown_action(BridgeService::Settings, other)),
        }
    }

    async fn migration_action(&self, action: &str, args: &Value) -> SyncResult<Value> {
        match action {
            "migrateFromLegacy" => {
                let payload: LegacySnapshot = parse_args(args)?;
                self.coordinator.migrate_payload(&payload).await?;
                Ok(json!(true))
            }
            "isMigrationComplete" => Ok(json!(self.coordinator.is_complete().await?)),
            "markMigrationComplete" => {
                self.coordinator.mark_complete().await?;
                Ok(json!(true))
            }
            "getMigrationState" => Ok(json!(self.coordinator.state().await.to_string())),
            other => Err(unknown_action(BridgeService::Migration, other)),
        }
    }

    async fn sync_action(&self, action: &str, args: &Value) -> SyncResult<Value> {
        match action {
            "syncFromLegacy" => to_data(&self.engine.sync_from_legacy_to_structured().await?),
            "syncToLegacy" => to_data(&self.engine.sync_from_structured_to_legacy().await?),
            "syncProfile" => {
                let NameArgs { name } = parse_args(args)?;
                let stored = self
                    .engine
                    .structured()
                    .find_profile_by_name(&name)
                    .await?
                    .ok_or_else(|| SyncError::not_found(EntityKind::Profile, name))?;
                to_data(&self.engine.sync_single_profile(&stored.profile).await?)
            }
            "getSyncStatus" => to_data(&self.engine.status().await),
            other => Err(unknown_action(BridgeService::Sync, other)),
        }
    }
}

fn unknown_action(service: BridgeService, action: &str) -> SyncError {
    SyncError::UnknownAction {
        service: service.to_string(),
        action: action.to_string(),
    }
}

/// Missing arguments decode as an empty object
fn parse_args<T: DeserializeOwned>(args: &Value) -> SyncResult<T> {
    let args = match args {
        Value::Null => json!({}),
        other => other.clone(),
    };
    serde_json::from_value(args).map_err(|e| SyncError::InvalidArguments(e.to_string()))
}

fn to_data<T: Serialize>(value: &T) -> SyncResult<Value> {
    Ok(serde_json::to_value(value)?)
}
