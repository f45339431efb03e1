// File: dualsync/src/web/mod.rs
pub mod handlers;
pub mod server;

pub use server::{create_router, start_web_server};

use std::sync::Arc;

use crate::bridge::Bridge;
use crate::config::AppConfig;
use crate::migration::MigrationCoordinator;
use crate::sync::SyncEngine;

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub bridge: Arc<Bridge>,
    // Read directly by the status endpoint
    pub engine: Arc<SyncEngine>,
    pub coordinator: Arc<MigrationCoordinator>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        bridge: Arc<Bridge>,
        engine: Arc<SyncEngine>,
        coordinator: Arc<MigrationCoordinator>,
    ) -> Self {
        Self {
            config,
            bridge,
            engine,
            coordinator,
        }
    }
}
