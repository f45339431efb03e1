// File: dualsync/src/config/credentials.rs
//! Credential storage capability.
//!
//! Secrets are scoped by an id (a profile id, usually) and never stored in
//! either sync store. The file-backed store keeps them in a separate TOML
//! file (config/credentials.toml) that should be excluded from version
//! control.
//!
//! Example credentials.toml:
//! ```toml
//! [scopes]
//! "0c9a1b7e-0d5f-4b55-9f3e-2f7c3f1d2a10" = "secret-token"
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{info, warn};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn save(&self, secret: &str, scope_id: &str) -> Result<()>;

    /// `None` when nothing is stored for the scope
    async fn get(&self, scope_id: &str) -> Result<Option<String>>;

    async fn delete(&self, scope_id: &str) -> Result<()>;

    async fn delete_all(&self) -> Result<()>;
}

/// Structure matching the credentials.toml file format
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    scopes: BTreeMap<String, String>,
}

pub struct FileCredentialStore {
    path: PathBuf,
    credentials: RwLock<CredentialsFile>,
}

impl FileCredentialStore {
    /// Load credentials from the given path.
    /// Starts empty if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let credentials = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read credentials file: {:?}", path))?;
            let parsed: CredentialsFile = toml::from_str(&content)
                .with_context(|| format!("Failed to parse credentials file: {:?}", path))?;
            info!(
                "Loaded credentials for {} scopes from {:?}",
                parsed.scopes.len(),
                path
            );
            parsed
        } else {
            warn!(
                "Credentials file not found at {:?}, starting with no stored credentials",
                path
            );
            CredentialsFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            credentials: RwLock::new(credentials),
        })
    }

    async fn persist(&self, credentials: &CredentialsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = toml::to_string(credentials).context("Failed to encode credentials")?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write credentials file: {:?}", self.path))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(&self, secret: &str, scope_id: &str) -> Result<()> {
        let mut credentials = self.credentials.write().await;
        credentials
            .scopes
            .insert(scope_id.to_string(), secret.to_string());
        self.persist(&credentials).await
    }

    async fn get(&self, scope_id: &str) -> Result<Option<String>> {
        Ok(self.credentials.read().await.scopes.get(scope_id).cloned())
    }

    async fn delete(&self, scope_id: &str) -> Result<()> {
        let mut credentials = self.credentials.write().await;
        if credentials.scopes.remove(scope_id).is_some() {
            self.persist(&credentials).await?;
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        let mut credentials = self.credentials.write().await;
        credentials.scopes.clear();
        self.persist(&credentials).await?;
        info!("Deleted all stored credentials");
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    scopes: RwLock<BTreeMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.scopes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.scopes.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, secret: &str, scope_id: &str) -> Result<()> {
        self.scopes
            .write()
            .await
            .insert(scope_id.to_string(), secret.to_string());
        Ok(())
    }

    async fn get(&self, scope_id: &str) -> Result<Option<String>> {
        Ok(self.scopes.read().await.get(scope_id).cloned())
    }

    async fn delete(&self, scope_id: &str) -> Result<()> {
        self.scopes.write().await.remove(scope_id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        self.scopes.write().await.clear();
        Ok(())
    }
}
