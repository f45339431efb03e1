// File: dualsync/src/legacy/mod.rs
//! Legacy store: named boxes of key/value entries, one JSON file per box.
//!
//! - `profiles` box: entries keyed by profile name
//! - `lunasea` box: the settings map under the `settings` key
//! - `indexers` box: entries keyed by position (`"0"`, `"1"`, ...)
//!
//! Boxes are loaded into memory when the store is opened. Writes mark a box
//! dirty and only reach disk on `save()`, which writes each dirty box to a
//! temporary file and renames it over the original. `discard()` reloads
//! every box from disk.

pub mod channel;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::accessor::StoreAccessor;
use crate::codec::legacy::{
    indexer_from_legacy, indexer_to_legacy, profile_from_legacy, profile_to_legacy,
    settings_from_legacy, settings_to_legacy,
};
use crate::codec::{LegacyMap, LegacySnapshot};
use crate::constants::boxes;
use crate::errors::{SyncError, SyncResult};
use crate::model::{AppSettings, Indexer, Profile};

pub use channel::{LegacyChannel, LocalLegacyChannel};

pub(crate) const STORE_NAME: &str = "legacy";

/// In-memory copy of every box plus the names of boxes with unsaved changes
#[derive(Debug, Default)]
struct Boxes {
    profiles: BTreeMap<String, LegacyMap>,
    settings: Option<LegacyMap>,
    indexers: Vec<LegacyMap>,
    dirty: BTreeSet<&'static str>,
}

impl Boxes {
    fn indexer_position(&self, host: &str) -> Option<usize> {
        self.indexers
            .iter()
            .position(|entry| entry.get("host").and_then(Value::as_str) == Some(host))
    }
}

pub struct LegacyStore {
    dir: PathBuf,
    boxes: RwLock<Option<Boxes>>,
}

impl LegacyStore {
    /// A store that is not opened yet; every call fails with
    /// `StoreUnavailable` until `load` succeeds.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            boxes: RwLock::new(None),
        }
    }

    pub async fn open(dir: impl Into<PathBuf>) -> SyncResult<Self> {
        let store = Self::new(dir);
        store.load().await?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// (Re)read every box from disk, dropping unsaved changes
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub async fn load(&self) -> SyncResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut loaded = Boxes::default();
        for (key, value) in self.read_box(boxes::PROFILES).await? {
            if let Value::Object(map) = value {
                loaded.profiles.insert(key, map);
            } else {
                warn!("Skipping non-object entry '{}' in profiles box", key);
            }
        }

        loaded.settings = self
            .read_box(boxes::SETTINGS)
            .await?
            .remove(boxes::SETTINGS_KEY)
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => {
                    warn!("Ignoring non-object settings entry");
                    None
                }
            });

        let mut positioned: Vec<(usize, LegacyMap)> = Vec::new();
        for (key, value) in self.read_box(boxes::INDEXERS).await? {
            match (key.parse::<usize>(), value) {
                (Ok(position), Value::Object(map)) => positioned.push((position, map)),
                _ => warn!("Skipping malformed entry '{}' in indexers box", key),
            }
        }
        positioned.sort_by_key(|(position, _)| *position);
        loaded.indexers = positioned.into_iter().map(|(_, map)| map).collect();

        debug!(
            "Loaded legacy boxes: {} profiles, settings: {}, {} indexers",
            loaded.profiles.len(),
            loaded.settings.is_some(),
            loaded.indexers.len()
        );
        *self.boxes.write().await = Some(loaded);
        Ok(())
    }

    pub async fn close(&self) {
        if let Some(b) = self.boxes.write().await.take() {
            if !b.dirty.is_empty() {
                warn!("Closing legacy store with unsaved boxes: {:?}", b.dirty);
            }
            info!("Legacy store closed");
        }
    }

    pub async fn is_open(&self) -> bool {
        self.boxes.read().await.is_some()
    }

    /// Make the boxes mirror `snapshot` exactly. Pending until `save()`.
    pub async fn replace_with(&self, snapshot: &LegacySnapshot) -> SyncResult<()> {
        let mut profiles = BTreeMap::new();
        for (position, map) in snapshot.profiles.iter().enumerate() {
            let name = map
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("profile-{}", position));
            profiles.insert(name, map.clone());
        }

        self.with_boxes_mut(|b| {
            b.profiles = profiles;
            b.settings = snapshot.settings.clone();
            b.indexers = snapshot.indexers.clone();
            b.dirty.extend(boxes::ALL);
            Ok(())
        })
        .await
    }

    async fn with_boxes<T>(&self, f: impl FnOnce(&Boxes) -> SyncResult<T>) -> SyncResult<T> {
        let guard = self.boxes.read().await;
        let b = guard
            .as_ref()
            .ok_or(SyncError::StoreUnavailable { store: STORE_NAME })?;
        f(b)
    }

    async fn with_boxes_mut<T>(
        &self,
        f: impl FnOnce(&mut Boxes) -> SyncResult<T>,
    ) -> SyncResult<T> {
        let mut guard = self.boxes.write().await;
        let b = guard
            .as_mut()
            .ok_or(SyncError::StoreUnavailable { store: STORE_NAME })?;
        f(b)
    }

    fn box_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    async fn read_box(&self, name: &str) -> SyncResult<Map<String, Value>> {
        let path = self.box_path(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Box file {} not found, starting empty", path.display());
                Ok(Map::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a box to its temp file; returns the temp and final paths
    async fn stage_box(
        &self,
        name: &str,
        contents: &Map<String, Value>,
    ) -> SyncResult<(PathBuf, PathBuf)> {
        let path = self.box_path(name);
        let tmp_path = self.dir.join(format!("{}.json.tmp", name));
        let bytes = serde_json::to_vec_pretty(contents)?;
        tokio::fs::write(&tmp_path, bytes).await?;
        Ok((tmp_path, path))
    }

    fn box_contents(b: &Boxes, name: &str) -> Map<String, Value> {
        match name {
            boxes::PROFILES => b
                .profiles
                .iter()
                .map(|(key, map)| (key.clone(), Value::Object(map.clone())))
                .collect(),
            boxes::SETTINGS => b
                .settings
                .iter()
                .map(|map| (boxes::SETTINGS_KEY.to_string(), Value::Object(map.clone())))
                .collect(),
            _ => b
                .indexers
                .iter()
                .enumerate()
                .map(|(position, map)| (position.to_string(), Value::Object(map.clone())))
                .collect(),
        }
    }
}

#[async_trait]
impl StoreAccessor for LegacyStore {
    fn store_name(&self) -> &'static str {
        STORE_NAME
    }

    async fn fetch_profiles(&self) -> SyncResult<Vec<Profile>> {
        self.with_boxes(|b| b.profiles.values().map(profile_from_legacy).collect())
            .await
    }

    async fn fetch_profile(&self, name: &str) -> SyncResult<Option<Profile>> {
        self.with_boxes(|b| b.profiles.get(name).map(profile_from_legacy).transpose())
            .await
    }

    async fn upsert_profile(&self, profile: &Profile) -> SyncResult<()> {
        let map = profile_to_legacy(profile);
        self.with_boxes_mut(|b| {
            b.profiles.insert(profile.name.clone(), map);
            b.dirty.insert(boxes::PROFILES);
            Ok(())
        })
        .await
    }

    async fn delete_profile(&self, name: &str) -> SyncResult<()> {
        self.with_boxes_mut(|b| {
            if b.profiles.remove(name).is_some() {
                b.dirty.insert(boxes::PROFILES);
            }
            Ok(())
        })
        .await
    }

    async fn fetch_settings(&self) -> SyncResult<Option<AppSettings>> {
        self.with_boxes(|b| Ok(b.settings.as_ref().map(settings_from_legacy)))
            .await
    }

    async fn upsert_settings(&self, settings: &AppSettings) -> SyncResult<()> {
        let map = settings_to_legacy(settings);
        self.with_boxes_mut(|b| {
            b.settings = Some(map);
            b.dirty.insert(boxes::SETTINGS);
            Ok(())
        })
        .await
    }

    async fn fetch_indexers(&self) -> SyncResult<Vec<Indexer>> {
        self.with_boxes(|b| b.indexers.iter().map(indexer_from_legacy).collect())
            .await
    }

    async fn fetch_indexer(&self, host: &str) -> SyncResult<Option<Indexer>> {
        self.with_boxes(|b| {
            b.indexer_position(host)
                .map(|position| indexer_from_legacy(&b.indexers[position]))
                .transpose()
        })
        .await
    }

    async fn upsert_indexer(&self, indexer: &Indexer) -> SyncResult<()> {
        let map = indexer_to_legacy(indexer);
        self.with_boxes_mut(|b| {
            match b.indexer_position(&indexer.host) {
                Some(position) => b.indexers[position] = map,
                None => b.indexers.push(map),
            }
            b.dirty.insert(boxes::INDEXERS);
            Ok(())
        })
        .await
    }

    async fn delete_indexer(&self, host: &str) -> SyncResult<()> {
        self.with_boxes_mut(|b| {
            let before = b.indexers.len();
            b.indexers
                .retain(|entry| entry.get("host").and_then(Value::as_str) != Some(host));
            if b.indexers.len() != before {
                b.dirty.insert(boxes::INDEXERS);
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn save(&self) -> SyncResult<()> {
        let mut guard = self.boxes.write().await;
        let b = guard
            .as_mut()
            .ok_or(SyncError::StoreUnavailable { store: STORE_NAME })?;

        // Stage every dirty box before replacing any, so a failed write
        // leaves all box files as they were
        let mut staged = Vec::with_capacity(b.dirty.len());
        for name in b.dirty.iter().copied() {
            let contents = Self::box_contents(b, name);
            match self.stage_box(name, &contents).await {
                Ok(paths) => staged.push(paths),
                Err(e) => {
                    warn!("Failed to stage box {}: {}", name, e);
                    for (tmp_path, _) in &staged {
                        if let Err(cleanup) = tokio::fs::remove_file(tmp_path).await {
                            warn!("Could not remove {}: {}", tmp_path.display(), cleanup);
                        }
                    }
                    return Err(e);
                }
            }
        }

        for (tmp_path, path) in &staged {
            tokio::fs::rename(tmp_path, path).await?;
            debug!("Wrote box {}", path.display());
        }
        b.dirty.clear();
        Ok(())
    }

    async fn discard(&self) -> SyncResult<()> {
        if !self.is_open().await {
            return Err(SyncError::StoreUnavailable { store: STORE_NAME });
        }
        self.load().await
    }
}
