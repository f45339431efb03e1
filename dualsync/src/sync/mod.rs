// File: dualsync/src/sync/mod.rs
//! Sync engine: directional passes between the legacy and structured stores.
//!
//! Every pass takes the engine-wide `SyncLock` without waiting and holds it
//! until the pass returns. Writes into the structured store happen inside a
//! single unit of work that is saved once at the end of a pass and rolled
//! back on any failure, so a failed pass leaves the structured store as it
//! was.

mod summary;

pub use summary::{SyncDirection, SyncStatus, SyncSummary};

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::accessor::StoreAccessor;
use crate::codec::legacy::{encode_snapshot, profile_to_legacy};
use crate::constants::{channel, operations, profiles::DEFAULT_PROFILE_NAME};
use crate::database::StructuredStore;
use crate::errors::{EntityKind, SyncError, SyncResult};
use crate::legacy::LegacyChannel;
use crate::model::{AppSettings, Indexer, Profile};
use crate::operation_tracker::SyncLock;

pub struct SyncEngine {
    structured: Arc<StructuredStore>,
    legacy: Arc<dyn StoreAccessor>,
    channel: Arc<dyn LegacyChannel>,
    lock: SyncLock,
    push_timeout: Duration,
    last_summary: RwLock<Option<SyncSummary>>,
}

impl SyncEngine {
    pub fn new(
        structured: Arc<StructuredStore>,
        legacy: Arc<dyn StoreAccessor>,
        channel: Arc<dyn LegacyChannel>,
        push_timeout: Duration,
    ) -> Self {
        Self {
            structured,
            legacy,
            channel,
            lock: SyncLock::new(),
            push_timeout,
            last_summary: RwLock::new(None),
        }
    }

    /// Shared handle on the engine lock
    pub fn lock(&self) -> &SyncLock {
        &self.lock
    }

    pub fn structured(&self) -> &Arc<StructuredStore> {
        &self.structured
    }

    pub fn legacy(&self) -> &Arc<dyn StoreAccessor> {
        &self.legacy
    }

    pub fn is_syncing(&self) -> bool {
        self.lock.is_busy()
    }

    /// Most recent successful pass
    pub async fn last_summary(&self) -> Option<SyncSummary> {
        self.last_summary.read().await.clone()
    }

    pub async fn status(&self) -> SyncStatus {
        SyncStatus {
            is_syncing: self.lock.is_busy(),
            active_operation: self.lock.active_operation(),
            last_summary: self.last_summary().await,
        }
    }

    /// Pull everything from the legacy store into the structured store.
    ///
    /// Records are matched by natural key: profiles by name, indexers by
    /// host, settings as a singleton. Existing records are updated in place.
    #[instrument(skip(self))]
    pub async fn sync_from_legacy_to_structured(&self) -> SyncResult<SyncSummary> {
        let _guard = self.lock.try_acquire(operations::LEGACY_TO_STRUCTURED)?;
        let _unit = self.structured.exclusive().await;

        match self.pull_from_legacy().await {
            Ok(summary) => {
                info!(
                    "Legacy -> structured complete: profiles {} created / {} updated, indexers {} created / {} updated",
                    summary.profiles_created,
                    summary.profiles_updated,
                    summary.indexers_created,
                    summary.indexers_updated
                );
                self.record(&summary).await;
                Ok(summary)
            }
            Err(e) => {
                error!("Legacy -> structured pass failed: {}", e);
                self.rollback_structured().await;
                Err(e)
            }
        }
    }

    /// Push the structured store's contents to the legacy side. The legacy
    /// store ends up mirroring the structured one.
    #[instrument(skip(self))]
    pub async fn sync_from_structured_to_legacy(&self) -> SyncResult<SyncSummary> {
        let _guard = self.lock.try_acquire(operations::STRUCTURED_TO_LEGACY)?;
        let unit = self.structured.exclusive().await;

        let profiles = self.structured.fetch_profiles().await?;
        let settings = self.structured.fetch_settings().await?;
        let indexers = self.structured.fetch_indexers().await?;
        drop(unit);
        let snapshot = encode_snapshot(&profiles, settings.as_ref(), &indexers);

        self.invoke(channel::REPLACE_ALL, serde_json::to_value(&snapshot)?)
            .await?;

        // Every mirrored record counts as updated on the legacy side
        let summary = SyncSummary {
            profiles_updated: profiles.len(),
            indexers_updated: indexers.len(),
            settings_synced: settings.is_some(),
            ..SyncSummary::new(SyncDirection::StructuredToLegacy)
        };
        info!(
            "Structured -> legacy complete: {} profiles, {} indexers pushed",
            profiles.len(),
            indexers.len()
        );
        self.record(&summary).await;
        Ok(summary)
    }

    /// Write one profile to the structured store, then push it to the legacy
    /// side. The active profile is normalized the same way a full pull does
    /// it, and the stored result is what gets pushed. The structured write is
    /// saved before the push, so a failed push leaves the structured store
    /// updated.
    #[instrument(skip(self, profile), fields(profile = %profile.name))]
    pub async fn sync_single_profile(&self, profile: &Profile) -> SyncResult<SyncSummary> {
        let _guard = self.lock.try_acquire(operations::SINGLE_PROFILE)?;

        let unit = self.structured.exclusive().await;
        let written = self.write_single_profile(profile).await;
        let (created, stored) = match written {
            Ok(written) => written,
            Err(e) => {
                error!("Single profile sync failed: {}", e);
                self.rollback_structured().await;
                return Err(e);
            }
        };
        drop(unit);

        self.invoke(
            channel::UPSERT_PROFILE,
            Value::Object(profile_to_legacy(&stored)),
        )
        .await?;

        let summary = SyncSummary {
            profiles_created: usize::from(created),
            profiles_updated: usize::from(!created),
            settings_synced: true,
            ..SyncSummary::new(SyncDirection::SingleProfile)
        };
        self.record(&summary).await;
        Ok(summary)
    }

    async fn pull_from_legacy(&self) -> SyncResult<SyncSummary> {
        let mut summary = SyncSummary::new(SyncDirection::LegacyToStructured);

        let legacy_settings = self.legacy.fetch_settings().await?;
        let legacy_profiles = self.legacy.fetch_profiles().await?;
        debug!(
            "Legacy holds {} profiles, settings: {}",
            legacy_profiles.len(),
            legacy_settings.is_some()
        );

        for profile in &legacy_profiles {
            let existed = self
                .structured
                .find_profile_by_name(&profile.name)
                .await?
                .is_some();
            let identity = self.structured.write_profile(profile).await?;
            if existed {
                debug!("Updated profile '{}' ({})", profile.name, identity.id);
                summary.profiles_updated += 1;
            } else {
                debug!("Created profile '{}' ({})", profile.name, identity.id);
                summary.profiles_created += 1;
            }
        }

        let legacy_indexers = self.legacy.fetch_indexers().await?;
        for indexer in Self::dedupe_indexers(legacy_indexers) {
            let existed = self
                .structured
                .indexer_record(&indexer.host)
                .await?
                .is_some();
            self.structured.write_indexer(&indexer).await?;
            if existed {
                summary.indexers_updated += 1;
            } else {
                summary.indexers_created += 1;
            }
        }

        // Settings are written when the legacy side has them, or when
        // profiles arrived and the active one must be recorded.
        if legacy_settings.is_some() || !legacy_profiles.is_empty() {
            let mut settings = match legacy_settings {
                Some(settings) => settings,
                None => self
                    .structured
                    .fetch_settings()
                    .await?
                    .unwrap_or_else(AppSettings::bootstrap),
            };
            if let Some(active) = self.normalize_active(&settings).await? {
                settings.enabled_profile = active;
            }
            self.structured.write_settings(&settings).await?;
            summary.settings_synced = true;
        }

        self.structured.save().await?;
        Ok(summary)
    }

    /// Collapse indexers sharing a host; the last occurrence wins
    fn dedupe_indexers(indexers: Vec<Indexer>) -> Vec<Indexer> {
        let total = indexers.len();
        let mut by_host: BTreeMap<String, Indexer> = BTreeMap::new();
        for indexer in indexers {
            by_host.insert(indexer.host.clone(), indexer);
        }
        if by_host.len() < total {
            warn!(
                "Collapsed {} duplicate legacy indexers by host",
                total - by_host.len()
            );
        }
        by_host.into_values().collect()
    }

    /// Leave exactly one active profile and return its name.
    ///
    /// Preference: the profile named by `enabled_profile`, then the first
    /// profile already flagged active, then `default`, then the first by name.
    async fn normalize_active(&self, settings: &AppSettings) -> SyncResult<Option<String>> {
        let stored = self.structured.list_profiles().await?;
        let profiles: Vec<&Profile> = stored.iter().map(|s| &s.profile).collect();

        let chosen = profiles
            .iter()
            .find(|p| p.name == settings.enabled_profile)
            .or_else(|| profiles.iter().find(|p| p.is_enabled))
            .or_else(|| profiles.iter().find(|p| p.name == DEFAULT_PROFILE_NAME))
            .or_else(|| profiles.first())
            .map(|p| p.name.clone());

        if let Some(name) = &chosen {
            let flagged = profiles.iter().filter(|p| p.is_enabled).count();
            let already = profiles.iter().any(|p| p.is_enabled && &p.name == name);
            if flagged != 1 || !already {
                info!("Setting '{}' as the single active profile", name);
                self.structured.set_single_enabled(name).await?;
            }
        }
        Ok(chosen)
    }

    /// Write one profile and restore the single-active invariant. Returns
    /// whether the profile is new, along with its stored form.
    async fn write_single_profile(&self, profile: &Profile) -> SyncResult<(bool, Profile)> {
        let existed = self
            .structured
            .find_profile_by_name(&profile.name)
            .await?
            .is_some();
        self.structured.write_profile(profile).await?;

        let mut settings = self
            .structured
            .fetch_settings()
            .await?
            .unwrap_or_else(AppSettings::bootstrap);
        if profile.is_enabled {
            settings.enabled_profile = profile.name.clone();
        }
        if let Some(active) = self.normalize_active(&settings).await? {
            settings.enabled_profile = active;
        }
        self.structured.write_settings(&settings).await?;

        let stored = self
            .structured
            .find_profile_by_name(&profile.name)
            .await?
            .ok_or_else(|| SyncError::not_found(EntityKind::Profile, profile.name.clone()))?;

        self.structured.save().await?;
        Ok((!existed, stored.profile))
    }

    async fn invoke(&self, method: &str, args: Value) -> SyncResult<Value> {
        match tokio::time::timeout(self.push_timeout, self.channel.invoke(method, args)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Legacy channel call {} timed out after {:?}",
                    method, self.push_timeout
                );
                Err(SyncError::ChannelFailure {
                    method: method.to_string(),
                    reason: format!("timed out after {}s", self.push_timeout.as_secs()),
                })
            }
        }
    }

    async fn rollback_structured(&self) {
        if let Err(e) = self.structured.discard().await {
            error!("Failed to roll back structured unit of work: {}", e);
        }
    }

    async fn record(&self, summary: &SyncSummary) {
        *self.last_summary.write().await = Some(summary.clone());
    }
}
