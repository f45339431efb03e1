//! Central repository for paths, keys, box names and timeouts
//!
//! Grouped by concern so the stores, the engine and the bridge agree on the
//! same literal values.

/// Default filesystem locations
pub mod paths {
    pub const CONFIG_DIR: &str = "config";
    pub const MAIN_CONFIG_FILE: &str = "main.toml";
    pub const DATABASE_PATH: &str = "data/dualsync.db";
    pub const LEGACY_DIR: &str = "data/legacy";
    pub const CREDENTIALS_PATH: &str = "config/credentials.toml";
}

/// Web server defaults
pub mod server {
    pub const DEFAULT_HOST: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8096;
}

/// Box names used by the legacy key/value store
pub mod boxes {
    pub const PROFILES: &str = "profiles";
    pub const SETTINGS: &str = "lunasea";
    pub const INDEXERS: &str = "indexers";

    /// Key of the single settings entry inside the settings box
    pub const SETTINGS_KEY: &str = "settings";

    pub const ALL: [&str; 3] = [PROFILES, SETTINGS, INDEXERS];
}

/// Keys of the structured store's metadata table
pub mod metadata {
    pub const MIGRATION_COMPLETE: &str = "legacy_migration_complete";
}

/// Methods understood by the legacy message channel
pub mod channel {
    pub const REPLACE_ALL: &str = "legacy.replaceAll";
    pub const UPSERT_PROFILE: &str = "legacy.upsertProfile";

    /// Default bound on a single channel call
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
}

/// Profile defaults
pub mod profiles {
    pub const DEFAULT_PROFILE_NAME: &str = "default";
}

/// Operation names recorded by the sync lock
pub mod operations {
    pub const LEGACY_TO_STRUCTURED: &str = "legacy_to_structured";
    pub const STRUCTURED_TO_LEGACY: &str = "structured_to_legacy";
    pub const SINGLE_PROFILE: &str = "single_profile";
}
