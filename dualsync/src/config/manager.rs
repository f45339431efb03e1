// File: dualsync/src/config/manager.rs
use super::AppConfig;
use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

use crate::constants::paths::MAIN_CONFIG_FILE;

pub struct ConfigManager {
    current_config: Arc<AppConfig>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<AppConfig> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<AppConfig> {
        let main_config_path = Path::new(config_dir).join(MAIN_CONFIG_FILE);
        if !main_config_path.exists() {
            warn!(
                "Main config not found at {}, using defaults",
                main_config_path.display()
            );
            return Ok(AppConfig::default());
        }

        let main_config_content = fs::read_to_string(&main_config_path).await.map_err(|e| {
            anyhow!(
                "Failed to read main config {}: {}",
                main_config_path.display(),
                e
            )
        })?;

        let config: AppConfig = toml::from_str(&main_config_content)
            .map_err(|e| anyhow!("Failed to parse main config: {}", e))?;

        if config.legacy_push_timeout_seconds == 0 {
            return Err(anyhow!("legacy_push_timeout_seconds must be greater than zero"));
        }

        info!(
            "Loaded configuration: database {}, legacy boxes in {}",
            config.database_path, config.legacy_dir
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_main_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::new(dir.path().to_string_lossy().to_string())
            .await
            .unwrap();
        let config = manager.get_current_config();
        assert_eq!(config.port, crate::constants::server::DEFAULT_PORT);
        assert!(config.migrate_on_startup);
    }

    #[tokio::test]
    async fn test_partial_main_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("main.toml"),
            "port = 9100\nlegacy_dir = \"/var/lib/dualsync/boxes\"\n",
        )
        .unwrap();

        let manager = ConfigManager::new(dir.path().to_string_lossy().to_string())
            .await
            .unwrap();
        let config = manager.get_current_config();
        assert_eq!(config.port, 9100);
        assert_eq!(config.legacy_dir, "/var/lib/dualsync/boxes");
        assert_eq!(config.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn test_zero_timeout_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.toml"), "legacy_push_timeout_seconds = 0\n").unwrap();
        assert!(ConfigManager::new(dir.path().to_string_lossy().to_string())
            .await
            .is_err());
    }
}
