//! Structured store: SQLite persistence for the canonical entities.
//!
//! This module provides SQLite persistence for:
//! - Profiles and their per-service credential rows
//! - The AppSettings singleton
//! - Indexers (unique by host)
//! - Sync metadata (migration completion flag)
//!
//! The module is organized into submodules:
//! - `records` - Row types
//! - `profiles` - Profile queries
//! - `settings` - AppSettings singleton queries
//! - `indexers` - Indexer queries
//! - `metadata` - Key/value metadata (migration flag)
//! - `accessor` - `StoreAccessor` implementation on top of the above
//!
//! Writes go into a unit of work (one SQLite transaction opened lazily by the
//! first write). Reads issued while it is open run inside it, so they observe
//! pending writes. `save()` commits it, `discard()` rolls it back. Callers
//! that write take `exclusive()` first so two units of work never interleave.

mod accessor;
mod indexers;
mod metadata;
mod profiles;
mod records;
mod settings;

pub use profiles::StoredProfile;
pub use records::*;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnection, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, error, info, instrument};

use crate::errors::{SyncError, SyncResult};

pub(crate) const STORE_NAME: &str = "structured";

type UnitOfWork = Option<Transaction<'static, Sqlite>>;

pub struct StructuredStore {
    pool: RwLock<Option<SqlitePool>>,
    unit_of_work: Mutex<UnitOfWork>,
    exclusive: Mutex<()>,
}

/// A connection borrowed either from the open unit of work or from the pool
pub(crate) struct StoreConn<'a> {
    unit_of_work: MutexGuard<'a, UnitOfWork>,
    pooled: Option<PoolConnection<Sqlite>>,
}

impl StoreConn<'_> {
    pub(crate) fn get(&mut self) -> SyncResult<&mut SqliteConnection> {
        if let Some(conn) = self.pooled.as_deref_mut() {
            return Ok(conn);
        }
        self.unit_of_work
            .as_deref_mut()
            .ok_or(SyncError::StoreUnavailable { store: STORE_NAME })
    }
}

impl StructuredStore {
    /// A store with no backing database. Every call fails with
    /// `StoreUnavailable` until `connect` succeeds.
    pub fn new() -> Self {
        Self {
            pool: RwLock::new(None),
            unit_of_work: Mutex::new(None),
            exclusive: Mutex::new(()),
        }
    }

    /// Create and connect in one step. `":memory:"` opens a private
    /// in-memory database.
    pub async fn open(database_path: &str) -> SyncResult<Self> {
        let store = Self::new();
        store.connect(database_path).await?;
        Ok(store)
    }

    pub async fn connect(&self, database_path: &str) -> SyncResult<()> {
        info!("=== Starting structured store initialization ===");
        info!("Database path: {}", database_path);

        let pool = if database_path == ":memory:" {
            // Every new connection to :memory: is a separate database, so pin one
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<std::time::Duration>)
                .max_lifetime(None::<std::time::Duration>)
                .connect("sqlite::memory:")
                .await?
        } else {
            if let Some(parent) = Path::new(database_path).parent() {
                if !parent.as_os_str().is_empty() {
                    debug!("Ensuring parent directory exists: {:?}", parent);
                    if let Err(e) = tokio::fs::create_dir_all(parent).await {
                        error!("FAILED to create parent directory {:?}: {}", parent, e);
                        return Err(e.into());
                    }
                }
            }

            let database_url = format!("sqlite:{}?mode=rwc", database_path);
            match SqlitePool::connect(&database_url).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("FAILED to connect to database: {}", e);
                    error!("   Connection URL: {}", database_url);
                    return Err(e.into());
                }
            }
        };
        info!("Successfully connected to SQLite database");

        if let Err(e) = Self::initialize_tables(&pool).await {
            error!("CRITICAL: Structured store table initialization failed: {}", e);
            return Err(e);
        }

        *self.pool.write().await = Some(pool);
        info!("=== Structured store initialization completed successfully ===");
        Ok(())
    }

    /// Roll back anything pending and release the database
    pub async fn close(&self) {
        if let Some(tx) = self.unit_of_work.lock().await.take() {
            if let Err(e) = tx.rollback().await {
                error!("Failed to roll back pending unit of work on close: {}", e);
            }
        }
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
            info!("Structured store closed");
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.pool.read().await.is_some()
    }

    async fn pool(&self) -> SyncResult<SqlitePool> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or(SyncError::StoreUnavailable { store: STORE_NAME })
    }

    /// Serializes units of work between callers. Hold the guard from the
    /// first write until `save()` or `discard()`.
    pub async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.exclusive.lock().await
    }

    /// Connection for reads: the open unit of work if any, else a pooled one
    pub(crate) async fn reader(&self) -> SyncResult<StoreConn<'_>> {
        let pool = self.pool().await?;
        let unit_of_work = self.unit_of_work.lock().await;
        let pooled = if unit_of_work.is_none() {
            Some(pool.acquire().await?)
        } else {
            None
        };
        Ok(StoreConn {
            unit_of_work,
            pooled,
        })
    }

    /// Connection for writes: the unit of work, opened on first use
    pub(crate) async fn writer(&self) -> SyncResult<StoreConn<'_>> {
        let pool = self.pool().await?;
        let mut unit_of_work = self.unit_of_work.lock().await;
        if unit_of_work.is_none() {
            debug!("Opening structured unit of work");
            *unit_of_work = Some(pool.begin().await?);
        }
        Ok(StoreConn {
            unit_of_work,
            pooled: None,
        })
    }

    #[instrument(skip(self))]
    pub(crate) async fn commit(&self) -> SyncResult<()> {
        self.pool().await?;
        if let Some(tx) = self.unit_of_work.lock().await.take() {
            tx.commit().await?;
            debug!("Structured unit of work committed");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub(crate) async fn rollback(&self) -> SyncResult<()> {
        self.pool().await?;
        if let Some(tx) = self.unit_of_work.lock().await.take() {
            tx.rollback().await?;
            info!("Structured unit of work rolled back");
        }
        Ok(())
    }

    /// Delete every entity row (metadata is kept). Part of a full reset;
    /// pending until `save()`.
    pub async fn wipe_entities(&self) -> SyncResult<()> {
        let mut conn = self.writer().await?;
        for table in ["profile_services", "profiles", "indexers", "app_settings"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(conn.get()?)
                .await?;
        }
        info!("Wiped all structured entity tables");
        Ok(())
    }

    async fn initialize_tables(pool: &SqlitePool) -> SyncResult<()> {
        let statements: [(&str, &str); 6] = [
            (
                "profiles table",
                r#"
                CREATE TABLE IF NOT EXISTS profiles (
                    id TEXT PRIMARY KEY,
                    name TEXT UNIQUE NOT NULL,
                    is_enabled BOOLEAN NOT NULL DEFAULT 0,
                    wol_enabled BOOLEAN NOT NULL DEFAULT 0,
                    wol_mac_address TEXT NOT NULL DEFAULT '',
                    wol_broadcast_address TEXT NOT NULL DEFAULT '',
                    created_at DATETIME NOT NULL,
                    updated_at DATETIME NOT NULL
                )
                "#,
            ),
            (
                "profile_services table",
                r#"
                CREATE TABLE IF NOT EXISTS profile_services (
                    profile_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                    service TEXT NOT NULL,
                    enabled BOOLEAN NOT NULL DEFAULT 0,
                    host TEXT NOT NULL DEFAULT '',
                    api_key TEXT,
                    username TEXT,
                    password TEXT,
                    custom_headers TEXT NOT NULL DEFAULT '{}',
                    strict_tls BOOLEAN NOT NULL DEFAULT 0,
                    PRIMARY KEY (profile_id, service)
                )
                "#,
            ),
            (
                "app_settings table",
                r#"
                CREATE TABLE IF NOT EXISTS app_settings (
                    singleton INTEGER PRIMARY KEY CHECK (singleton = 1),
                    id TEXT NOT NULL,
                    enabled_profile TEXT NOT NULL DEFAULT '',
                    theme_amoled BOOLEAN NOT NULL DEFAULT 0,
                    theme_amoled_border BOOLEAN NOT NULL DEFAULT 0,
                    theme_image_background_opacity INTEGER NOT NULL DEFAULT 0,
                    drawer_automatic_manage BOOLEAN NOT NULL DEFAULT 0,
                    drawer_manual_order TEXT NOT NULL DEFAULT '[]',
                    quick_actions TEXT NOT NULL DEFAULT '{}',
                    networking_tls_validation BOOLEAN NOT NULL DEFAULT 0,
                    use_24_hour_time BOOLEAN NOT NULL DEFAULT 0,
                    enable_in_app_notifications BOOLEAN NOT NULL DEFAULT 0,
                    changelog_last_build_version INTEGER NOT NULL DEFAULT 0,
                    created_at DATETIME NOT NULL,
                    updated_at DATETIME NOT NULL
                )
                "#,
            ),
            (
                "indexers table",
                r#"
                CREATE TABLE IF NOT EXISTS indexers (
                    id TEXT PRIMARY KEY,
                    display_name TEXT NOT NULL DEFAULT '',
                    host TEXT UNIQUE NOT NULL,
                    api_key TEXT NOT NULL DEFAULT '',
                    custom_headers TEXT NOT NULL DEFAULT '{}',
                    created_at DATETIME NOT NULL,
                    updated_at DATETIME NOT NULL
                )
                "#,
            ),
            (
                "sync_metadata table",
                r#"
                CREATE TABLE IF NOT EXISTS sync_metadata (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at DATETIME NOT NULL
                )
                "#,
            ),
            (
                "profile_services index",
                "CREATE INDEX IF NOT EXISTS idx_profile_services_profile ON profile_services(profile_id)",
            ),
        ];

        for (step, (label, sql)) in statements.iter().enumerate() {
            info!("Step {}: Creating {}...", step + 1, label);
            if let Err(e) = sqlx::query(sql).execute(pool).await {
                error!("FAILED to create {}: {}", label, e);
                return Err(e.into());
            }
        }

        info!("All structured store tables and indexes created successfully");
        Ok(())
    }
}

impl Default for StructuredStore {
    fn default() -> Self {
        Self::new()
    }
}
