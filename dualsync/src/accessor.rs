//! The repository interface both stores implement.
//!
//! Every write is keyed by the entity's natural key (profile `name`, indexer
//! `host`, the settings singleton) and lands in a unit of work that only
//! becomes durable on `save()`.

use async_trait::async_trait;

use crate::errors::SyncResult;
use crate::model::{AppSettings, Indexer, Profile};

#[async_trait]
pub trait StoreAccessor: Send + Sync {
    /// Short store name used in logs and errors
    fn store_name(&self) -> &'static str;

    async fn fetch_profiles(&self) -> SyncResult<Vec<Profile>>;

    async fn fetch_profile(&self, name: &str) -> SyncResult<Option<Profile>>;

    /// Insert if no profile has this name, else update that profile in place
    async fn upsert_profile(&self, profile: &Profile) -> SyncResult<()>;

    /// No-op when the profile does not exist
    async fn delete_profile(&self, name: &str) -> SyncResult<()>;

    async fn fetch_settings(&self) -> SyncResult<Option<AppSettings>>;

    async fn upsert_settings(&self, settings: &AppSettings) -> SyncResult<()>;

    async fn fetch_indexers(&self) -> SyncResult<Vec<Indexer>>;

    async fn fetch_indexer(&self, host: &str) -> SyncResult<Option<Indexer>>;

    /// Insert if no indexer has this host, else update that indexer in place
    async fn upsert_indexer(&self, indexer: &Indexer) -> SyncResult<()>;

    /// No-op when the indexer does not exist
    async fn delete_indexer(&self, host: &str) -> SyncResult<()>;

    /// Make every pending write durable
    async fn save(&self) -> SyncResult<()>;

    /// Drop every pending write
    async fn discard(&self) -> SyncResult<()>;
}
