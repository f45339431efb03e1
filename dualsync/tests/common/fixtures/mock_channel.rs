//! Legacy channel doubles

use async_trait::async_trait;
use dualsync::{LegacyChannel, SyncError, SyncResult};
use serde_json::{json, Value};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Blocks every call until `release` is signalled, so a test can observe
/// the engine while a pass is in flight
#[derive(Default)]
pub struct GatedChannel {
    pub entered: Notify,
    pub release: Notify,
    calls: Mutex<Vec<String>>,
}

impl GatedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LegacyChannel for GatedChannel {
    async fn invoke(&self, method: &str, _args: Value) -> SyncResult<Value> {
        self.calls.lock().unwrap().push(method.to_string());
        self.entered.notify_one();
        self.release.notified().await;
        Ok(json!({}))
    }
}

/// Rejects every call
pub struct FailingChannel;

#[async_trait]
impl LegacyChannel for FailingChannel {
    async fn invoke(&self, method: &str, _args: Value) -> SyncResult<Value> {
        Err(SyncError::ChannelFailure {
            method: method.to_string(),
            reason: "receiver went away".to_string(),
        })
    }
}
