use async_trait::async_trait;
use tracing::instrument;

use super::{StructuredStore, STORE_NAME};
use crate::accessor::StoreAccessor;
use crate::codec::structured::settings_from_structured;
use crate::errors::SyncResult;
use crate::model::{AppSettings, Indexer, Profile};

#[async_trait]
impl StoreAccessor for StructuredStore {
    fn store_name(&self) -> &'static str {
        STORE_NAME
    }

    async fn fetch_profiles(&self) -> SyncResult<Vec<Profile>> {
        Ok(self
            .list_profiles()
            .await?
            .into_iter()
            .map(|stored| stored.profile)
            .collect())
    }

    async fn fetch_profile(&self, name: &str) -> SyncResult<Option<Profile>> {
        Ok(self
            .find_profile_by_name(name)
            .await?
            .map(|stored| stored.profile))
    }

    #[instrument(skip(self, profile), fields(profile = %profile.name))]
    async fn upsert_profile(&self, profile: &Profile) -> SyncResult<()> {
        self.write_profile(profile).await.map(|_| ())
    }

    async fn delete_profile(&self, name: &str) -> SyncResult<()> {
        self.remove_profile(name).await.map(|_| ())
    }

    async fn fetch_settings(&self) -> SyncResult<Option<AppSettings>> {
        self.settings_record()
            .await?
            .as_ref()
            .map(settings_from_structured)
            .transpose()
    }

    async fn upsert_settings(&self, settings: &AppSettings) -> SyncResult<()> {
        self.write_settings(settings).await.map(|_| ())
    }

    async fn fetch_indexers(&self) -> SyncResult<Vec<Indexer>> {
        self.list_indexers().await
    }

    async fn fetch_indexer(&self, host: &str) -> SyncResult<Option<Indexer>> {
        self.indexer_record(host)
            .await?
            .as_ref()
            .map(crate::codec::structured::indexer_from_structured)
            .transpose()
    }

    #[instrument(skip(self, indexer), fields(host = %indexer.host))]
    async fn upsert_indexer(&self, indexer: &Indexer) -> SyncResult<()> {
        self.write_indexer(indexer).await.map(|_| ())
    }

    async fn delete_indexer(&self, host: &str) -> SyncResult<()> {
        self.remove_indexer(host).await.map(|_| ())
    }

    async fn save(&self) -> SyncResult<()> {
        self.commit().await
    }

    async fn discard(&self) -> SyncResult<()> {
        self.rollback().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServiceKind;

    fn indexer(host: &str, name: &str) -> Indexer {
        Indexer {
            display_name: name.to_string(),
            host: host.to_string(),
            api_key: "key".to_string(),
            ..Indexer::default()
        }
    }

    #[tokio::test]
    async fn test_fetches_on_empty_store_are_empty() {
        let store = StructuredStore::open(":memory:").await.unwrap();
        assert!(store.fetch_profiles().await.unwrap().is_empty());
        assert!(store.fetch_profile("nobody").await.unwrap().is_none());
        assert!(store.fetch_settings().await.unwrap().is_none());
        assert!(store.fetch_indexers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let store = StructuredStore::open(":memory:").await.unwrap();
        store.delete_profile("nobody").await.unwrap();
        store.delete_indexer("http://nowhere").await.unwrap();
        store.save().await.unwrap();
    }

    #[tokio::test]
    async fn test_indexer_upsert_by_host() {
        let store = StructuredStore::open(":memory:").await.unwrap();
        store.upsert_indexer(&indexer("http://idx", "First")).await.unwrap();
        store.upsert_indexer(&indexer("http://idx", "Renamed")).await.unwrap();
        store.save().await.unwrap();

        let indexers = store.fetch_indexers().await.unwrap();
        assert_eq!(indexers.len(), 1);
        assert_eq!(indexers[0].display_name, "Renamed");
    }

    #[tokio::test]
    async fn test_settings_singleton_keeps_identity() {
        let store = StructuredStore::open(":memory:").await.unwrap();
        let mut settings = AppSettings::bootstrap();
        store.upsert_settings(&settings).await.unwrap();
        store.save().await.unwrap();
        let first_id = store.settings_record().await.unwrap().unwrap().id;

        settings.theme_amoled = true;
        settings.quick_actions.insert(ServiceKind::Radarr, true);
        store.upsert_settings(&settings).await.unwrap();
        store.save().await.unwrap();

        assert_eq!(store.count_settings().await.unwrap(), 1);
        assert_eq!(store.settings_record().await.unwrap().unwrap().id, first_id);
        assert_eq!(store.fetch_settings().await.unwrap(), Some(settings));
    }
}
