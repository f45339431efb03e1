pub mod accessor;
pub mod bridge;
pub mod codec;
pub mod config;
pub mod constants;
pub mod context;
pub mod database;
pub mod errors;
pub mod legacy;
pub mod migration;
pub mod model;
pub mod operation_tracker;
pub mod services;
pub mod sync;
pub mod web;

// Re-export commonly used types
pub use accessor::StoreAccessor;
pub use bridge::{Bridge, BridgeRequest, BridgeResponse};
pub use config::{AppConfig, ConfigManager, CredentialStore};
pub use context::AppContext;
pub use database::StructuredStore;
pub use errors::{SyncError, SyncResult};
pub use legacy::{LegacyChannel, LegacyStore, LocalLegacyChannel};
pub use migration::{MigrationCoordinator, MigrationState};
pub use model::{AppSettings, Indexer, Profile, ServiceKind};
pub use operation_tracker::SyncLock;
pub use sync::{SyncEngine, SyncSummary};
