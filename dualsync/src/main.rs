// File: dualsync/src/main.rs
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use dualsync::config::FileCredentialStore;
use dualsync::constants::paths;
use dualsync::web::{start_web_server, AppState};
use dualsync::{
    AppContext, ConfigManager, LegacyStore, LocalLegacyChannel, MigrationState, StructuredStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("dualsync=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting dualsync");

    let config_dir =
        std::env::var("DUALSYNC_CONFIG_DIR").unwrap_or_else(|_| paths::CONFIG_DIR.to_string());
    let config_manager = ConfigManager::new(config_dir).await?;
    let config = config_manager.get_current_config();

    // Open both stores
    let structured = Arc::new(
        StructuredStore::open(&config.database_path)
            .await
            .with_context(|| {
                format!("Failed to open structured store at {}", config.database_path)
            })?,
    );
    info!("Structured store initialized");

    let legacy = Arc::new(
        LegacyStore::open(&config.legacy_dir)
            .await
            .with_context(|| format!("Failed to open legacy store at {}", config.legacy_dir))?,
    );
    info!("Legacy store initialized");

    let credentials = Arc::new(FileCredentialStore::load(Path::new(&config.credentials_path))?);
    let channel = Arc::new(LocalLegacyChannel::new(legacy.clone()));

    let context = AppContext::new(
        structured.clone(),
        legacy.clone(),
        channel,
        credentials,
        Duration::from_secs(config.legacy_push_timeout_seconds),
    );

    if config.migrate_on_startup {
        match context.coordinator.run_startup().await {
            Ok(MigrationState::Failed) => {
                warn!("Legacy migration failed, it will be retried on next launch")
            }
            Ok(state) => info!("Startup migration finished: {}", state),
            Err(e) => {
                error!("Startup migration could not run: {}", e);
                return Err(e.into());
            }
        }
    } else {
        warn!("Startup migration disabled in configuration");
        context.coordinator.bootstrap_if_needed().await?;
    }

    let state = AppState::new(
        config.clone(),
        context.bridge.clone(),
        context.engine.clone(),
        context.coordinator.clone(),
    );

    let served = start_web_server(state).await;

    structured.close().await;
    legacy.close().await;
    info!("dualsync stopped");
    served
}
