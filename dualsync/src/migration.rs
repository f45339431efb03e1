// File: dualsync/src/migration.rs
//! One-time migration from the legacy store, plus first-install bootstrap
//!
//! The completion flag lives in the structured store's metadata table and is
//! only written after a successful legacy -> structured pass. A failed
//! migration is not recorded anywhere, so the next launch simply tries again.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::accessor::StoreAccessor;
use crate::codec::legacy::decode_snapshot;
use crate::codec::LegacySnapshot;
use crate::constants::metadata::MIGRATION_COMPLETE;
use crate::errors::SyncResult;
use crate::model::{AppSettings, Profile};
use crate::sync::SyncEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    NotStarted,
    Skipped,
    Running,
    Complete,
    Failed,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationState::NotStarted => "not_started",
            MigrationState::Skipped => "skipped",
            MigrationState::Running => "running",
            MigrationState::Complete => "complete",
            MigrationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub struct MigrationCoordinator {
    engine: Arc<SyncEngine>,
    state: RwLock<MigrationState>,
}

impl MigrationCoordinator {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self {
            engine,
            state: RwLock::new(MigrationState::NotStarted),
        }
    }

    pub async fn state(&self) -> MigrationState {
        *self.state.read().await
    }

    async fn set_state(&self, state: MigrationState) {
        *self.state.write().await = state;
    }

    pub async fn is_complete(&self) -> SyncResult<bool> {
        self.engine.structured().get_flag(MIGRATION_COMPLETE).await
    }

    pub async fn mark_complete(&self) -> SyncResult<()> {
        let structured = self.engine.structured();
        let _unit = structured.exclusive().await;

        let result = async {
            structured.set_metadata(MIGRATION_COMPLETE, "true").await?;
            structured.save().await
        }
        .await;

        if let Err(e) = result {
            error!("Failed to persist migration flag: {}", e);
            if let Err(rollback) = structured.discard().await {
                error!("Rollback after flag write failed: {}", rollback);
            }
            return Err(e);
        }
        info!("Legacy migration marked complete");
        Ok(())
    }

    /// Called once per process start. Bootstraps defaults unless a
    /// migration was attempted and failed.
    #[instrument(skip(self))]
    pub async fn run_startup(&self) -> SyncResult<MigrationState> {
        let state = if self.is_complete().await? {
            info!("Legacy migration already complete, skipping");
            self.set_state(MigrationState::Skipped).await;
            MigrationState::Skipped
        } else if self.legacy_has_data().await {
            match self.migrate().await {
                Ok(state) => state,
                Err(e) => {
                    error!("Startup migration failed, will retry on next launch: {}", e);
                    MigrationState::Failed
                }
            }
        } else {
            info!("Legacy store is empty, nothing to migrate");
            MigrationState::NotStarted
        };

        // After a failed attempt the store stays empty until the retry
        if state != MigrationState::Failed {
            self.bootstrap_if_needed().await?;
        }
        Ok(state)
    }

    /// Run the legacy -> structured pass unless the flag is already set
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> SyncResult<MigrationState> {
        if self.is_complete().await? {
            self.set_state(MigrationState::Skipped).await;
            return Ok(MigrationState::Skipped);
        }

        self.set_state(MigrationState::Running).await;
        info!("Starting legacy migration");

        let outcome = match self.engine.sync_from_legacy_to_structured().await {
            Ok(summary) => {
                info!(
                    "Migrated {} new records ({} profiles updated, {} indexers updated)",
                    summary.records_created(),
                    summary.profiles_updated,
                    summary.indexers_updated
                );
                self.mark_complete().await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                self.set_state(MigrationState::Complete).await;
                Ok(MigrationState::Complete)
            }
            Err(e) => {
                self.set_state(MigrationState::Failed).await;
                Err(e)
            }
        }
    }

    /// Stage a bulk legacy payload into the legacy store, then migrate it.
    /// Does nothing once the flag is set.
    #[instrument(skip(self, payload))]
    pub async fn migrate_payload(&self, payload: &LegacySnapshot) -> SyncResult<MigrationState> {
        if self.is_complete().await? {
            info!("Legacy migration already complete, ignoring payload");
            self.set_state(MigrationState::Skipped).await;
            return Ok(MigrationState::Skipped);
        }

        if payload.is_empty() {
            info!("Legacy payload is empty, migrating the legacy store as it is");
            let state = self.migrate().await?;
            self.bootstrap_if_needed().await?;
            return Ok(state);
        }

        let decoded = decode_snapshot(payload)?;
        let legacy = self.engine.legacy();

        let staged = async {
            if let Some(settings) = &decoded.settings {
                legacy.upsert_settings(settings).await?;
            }
            for profile in &decoded.profiles {
                legacy.upsert_profile(profile).await?;
            }
            for indexer in &decoded.indexers {
                legacy.upsert_indexer(indexer).await?;
            }
            legacy.save().await
        }
        .await;
        if let Err(e) = staged {
            error!("Failed to stage legacy payload: {}", e);
            if let Err(discard) = legacy.discard().await {
                error!("Discarding staged payload failed: {}", discard);
            }
            return Err(e);
        }
        info!(
            "Staged legacy payload: {} profiles, {} indexers",
            decoded.profiles.len(),
            decoded.indexers.len()
        );

        let state = self.migrate().await?;
        self.bootstrap_if_needed().await?;
        Ok(state)
    }

    /// Create the default profile and settings when the structured store has
    /// no settings at all. Returns true when anything was written.
    #[instrument(skip(self))]
    pub async fn bootstrap_if_needed(&self) -> SyncResult<bool> {
        let structured = self.engine.structured();
        let _unit = structured.exclusive().await;

        if structured.settings_record().await?.is_some() {
            return Ok(false);
        }

        let result = async {
            let mut settings = AppSettings::bootstrap();
            let existing = structured.list_profiles().await?;
            if existing.is_empty() {
                let profile = Profile::default_profile();
                structured.write_profile(&profile).await?;
                settings.enabled_profile = profile.name;
            } else {
                // Keep whatever profiles exist, only record the active one
                let active = existing
                    .iter()
                    .find(|s| s.profile.is_enabled)
                    .unwrap_or(&existing[0]);
                structured.set_single_enabled(&active.profile.name).await?;
                settings.enabled_profile = active.profile.name.clone();
            }
            structured.write_settings(&settings).await?;
            structured.save().await
        }
        .await;

        match result {
            Ok(()) => {
                info!("Bootstrapped default profile and settings");
                Ok(true)
            }
            Err(e) => {
                if let Err(rollback) = structured.discard().await {
                    error!("Rollback after bootstrap failure failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    async fn legacy_has_data(&self) -> bool {
        let legacy = self.engine.legacy();
        let probe = async {
            Ok::<bool, crate::errors::SyncError>(
                !legacy.fetch_profiles().await?.is_empty()
                    || legacy.fetch_settings().await?.is_some()
                    || !legacy.fetch_indexers().await?.is_empty(),
            )
        }
        .await;

        match probe {
            Ok(has_data) => has_data,
            Err(e) => {
                // Let the migration attempt surface the error
                warn!("Could not inspect legacy store: {}", e);
                true
            }
        }
    }
}
