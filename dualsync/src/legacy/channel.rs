// File: dualsync/src/legacy/channel.rs
//! Message channel through which the legacy store is mutated.
//!
//! The structured side never writes legacy boxes directly on the push path;
//! it sends `invoke(method, args)` messages and the receiving side applies
//! them. `LocalLegacyChannel` is the in-process receiver backed by a
//! `LegacyStore`.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::LegacyStore;
use crate::accessor::StoreAccessor;
use crate::codec::legacy::profile_from_legacy;
use crate::codec::{LegacyMap, LegacySnapshot};
use crate::constants::channel;
use crate::errors::{SyncError, SyncResult};

#[async_trait]
pub trait LegacyChannel: Send + Sync {
    async fn invoke(&self, method: &str, args: Value) -> SyncResult<Value>;
}

pub struct LocalLegacyChannel {
    store: Arc<LegacyStore>,
}

impl LocalLegacyChannel {
    pub fn new(store: Arc<LegacyStore>) -> Self {
        Self { store }
    }

    fn rejected(method: &str, reason: impl Into<String>) -> SyncError {
        SyncError::ChannelFailure {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    async fn replace_all(&self, args: Value) -> SyncResult<Value> {
        let snapshot: LegacySnapshot = serde_json::from_value(args)
            .map_err(|e| Self::rejected(channel::REPLACE_ALL, e.to_string()))?;

        self.store.replace_with(&snapshot).await?;
        if let Err(e) = self.store.save().await {
            self.store.discard().await?;
            return Err(e);
        }

        Ok(json!({
            "profiles": snapshot.profiles.len(),
            "indexers": snapshot.indexers.len(),
            "settings": snapshot.settings.is_some(),
        }))
    }

    async fn upsert_profile(&self, args: Value) -> SyncResult<Value> {
        let map: LegacyMap = serde_json::from_value(args)
            .map_err(|e| Self::rejected(channel::UPSERT_PROFILE, e.to_string()))?;
        let profile = profile_from_legacy(&map)?;

        self.store.upsert_profile(&profile).await?;
        if let Err(e) = self.store.save().await {
            self.store.discard().await?;
            return Err(e);
        }
        Ok(json!({ "name": profile.name }))
    }
}

#[async_trait]
impl LegacyChannel for LocalLegacyChannel {
    #[instrument(skip(self, args))]
    async fn invoke(&self, method: &str, args: Value) -> SyncResult<Value> {
        debug!("Legacy channel call {}", method);
        match method {
            channel::REPLACE_ALL => self.replace_all(args).await,
            channel::UPSERT_PROFILE => self.upsert_profile(args).await,
            other => Err(Self::rejected(other, "unsupported method")),
        }
    }
}
