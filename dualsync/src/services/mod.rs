// File: dualsync/src/services/mod.rs

pub mod profile_service;
pub mod settings_service;

pub use profile_service::{NewProfile, ProfilePatch, ProfileService, ProfileView};
pub use settings_service::{SettingsPatch, SettingsService, SettingsView};

use tracing::error;

use crate::accessor::StoreAccessor;
use crate::database::StructuredStore;
use crate::errors::SyncResult;

/// Roll the unit of work back when `result` is an error, then hand it back
async fn finish_unit<T>(structured: &StructuredStore, result: SyncResult<T>) -> SyncResult<T> {
    if result.is_err() {
        if let Err(e) = structured.discard().await {
            error!("Failed to roll back structured unit of work: {}", e);
        }
    }
    result
}
