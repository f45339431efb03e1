//! Fully wired engine over an in-memory structured store and a temp-dir
//! legacy store

use dualsync::config::MemoryCredentialStore;
use dualsync::{
    AppContext, BridgeRequest, BridgeResponse, LegacyChannel, LegacyStore, LocalLegacyChannel,
    StructuredStore,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub struct TestHarness {
    pub dir: TempDir,
    pub structured: Arc<StructuredStore>,
    pub legacy: Arc<LegacyStore>,
    pub credentials: Arc<MemoryCredentialStore>,
    pub context: AppContext,
}

impl TestHarness {
    /// Harness whose legacy channel writes into its own legacy store
    pub async fn new() -> Self {
        Self::build(None).await
    }

    pub async fn with_channel(channel: Arc<dyn LegacyChannel>) -> Self {
        Self::build(Some(channel)).await
    }

    async fn build(channel: Option<Arc<dyn LegacyChannel>>) -> Self {
        let dir = TempDir::new().unwrap();
        let structured = Arc::new(StructuredStore::open(":memory:").await.unwrap());
        let legacy = Arc::new(LegacyStore::open(dir.path().join("boxes")).await.unwrap());
        let credentials = Arc::new(MemoryCredentialStore::new());
        let channel =
            channel.unwrap_or_else(|| Arc::new(LocalLegacyChannel::new(legacy.clone())));

        let context = AppContext::new(
            structured.clone(),
            legacy.clone(),
            channel,
            credentials.clone(),
            Duration::from_secs(5),
        );

        Self {
            dir,
            structured,
            legacy,
            credentials,
            context,
        }
    }

    pub fn legacy_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("boxes")
    }

    /// Write a raw box file and reload the legacy store from disk
    pub async fn write_legacy_box(&self, name: &str, contents: Value) {
        let path = self.legacy_dir().join(format!("{}.json", name));
        std::fs::write(&path, serde_json::to_vec_pretty(&contents).unwrap()).unwrap();
        self.legacy.load().await.unwrap();
    }

    pub async fn call(&self, service: &str, action: &str, arguments: Value) -> BridgeResponse {
        self.context
            .bridge
            .handle(BridgeRequest::new(service, action, arguments))
            .await
    }

    /// Call the bridge and return `data`, panicking on failure
    pub async fn call_ok(&self, service: &str, action: &str, arguments: Value) -> Value {
        let response = self.call(service, action, arguments).await;
        assert!(
            response.success,
            "{}.{} failed: {:?}",
            service, action, response.error
        );
        response.data.unwrap_or(Value::Null)
    }
}
