// File: dualsync/src/context.rs
//! Wiring of stores, engine, coordinator, services and bridge.
//!
//! Everything is constructed once and shared through `Arc`; nothing in the
//! crate reaches for a global instance.

use std::sync::Arc;
use std::time::Duration;

use crate::accessor::StoreAccessor;
use crate::bridge::Bridge;
use crate::config::CredentialStore;
use crate::database::StructuredStore;
use crate::legacy::LegacyChannel;
use crate::migration::MigrationCoordinator;
use crate::services::{ProfileService, SettingsService};
use crate::sync::SyncEngine;

#[derive(Clone)]
pub struct AppContext {
    pub structured: Arc<StructuredStore>,
    pub engine: Arc<SyncEngine>,
    pub coordinator: Arc<MigrationCoordinator>,
    pub profiles: Arc<ProfileService>,
    pub settings: Arc<SettingsService>,
    pub bridge: Arc<Bridge>,
}

impl AppContext {
    pub fn new(
        structured: Arc<StructuredStore>,
        legacy: Arc<dyn StoreAccessor>,
        channel: Arc<dyn LegacyChannel>,
        credentials: Arc<dyn CredentialStore>,
        push_timeout: Duration,
    ) -> Self {
        let engine = Arc::new(SyncEngine::new(
            structured.clone(),
            legacy,
            channel,
            push_timeout,
        ));
        let coordinator = Arc::new(MigrationCoordinator::new(engine.clone()));
        let profiles = Arc::new(ProfileService::new(structured.clone(), credentials.clone()));
        let settings = Arc::new(SettingsService::new(
            structured.clone(),
            credentials,
            coordinator.clone(),
        ));
        let bridge = Arc::new(Bridge::new(
            profiles.clone(),
            settings.clone(),
            coordinator.clone(),
            engine.clone(),
        ));

        Self {
            structured,
            engine,
            coordinator,
            profiles,
            settings,
            bridge,
        }
    }
}
