// File: dualsync/src/config/mod.rs
pub mod credentials;
pub mod manager;
use serde::{Deserialize, Serialize};
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use manager::ConfigManager;

use crate::constants::{channel, paths, server};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_legacy_dir")]
    pub legacy_dir: String,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_push_timeout")]
    pub legacy_push_timeout_seconds: u64,
    // Run the startup migration before serving requests
    #[serde(default = "default_migrate_on_startup")]
    pub migrate_on_startup: bool,
}

fn default_host() -> String {
    server::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    server::DEFAULT_PORT
}

fn default_database_path() -> String {
    paths::DATABASE_PATH.to_string()
}

fn default_legacy_dir() -> String {
    paths::LEGACY_DIR.to_string()
}

fn default_credentials_path() -> String {
    paths::CREDENTIALS_PATH.to_string()
}

fn default_push_timeout() -> u64 {
    channel::DEFAULT_TIMEOUT_SECONDS
}

fn default_migrate_on_startup() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            legacy_dir: default_legacy_dir(),
            credentials_path: default_credentials_path(),
            legacy_push_timeout_seconds: default_push_timeout(),
            migrate_on_startup: default_migrate_on_startup(),
        }
    }
}
