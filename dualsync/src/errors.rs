//! Error taxonomy for the sync engine and everything underneath the bridge.
//!
//! Codec and store layers return these typed errors; the sync engine lets them
//! propagate after releasing its lock, and only the bridge façade converts
//! them into the transport-neutral `BridgeError` shape.

use std::fmt;

use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

/// Entity kinds named in error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Profile,
    AppSettings,
    Indexer,
    MigrationFlag,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Profile => "profile",
            EntityKind::AppSettings => "app_settings",
            EntityKind::Indexer => "indexer",
            EntityKind::MigrationFlag => "migration_flag",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Backend context was never opened (or has been closed)
    #[error("{store} store is not initialized")]
    StoreUnavailable { store: &'static str },

    /// Exclusive sync lock is held by another operation
    #[error("sync operation '{operation}' is already running (started {elapsed_ms}ms ago), retry later")]
    SyncInProgress { operation: String, elapsed_ms: i64 },

    /// A required field was missing or malformed during conversion
    #[error("cannot decode {entity}: field '{key}' {reason}")]
    Decode {
        entity: EntityKind,
        key: String,
        reason: String,
    },

    /// An expected singleton record is absent
    #[error("expected {entity} record is missing")]
    NoData { entity: EntityKind },

    #[error("{entity} '{key}' not found")]
    NotFound { entity: EntityKind, key: String },

    #[error("unknown service '{0}'")]
    UnknownService(String),

    #[error("unknown action '{action}' for service '{service}'")]
    UnknownAction { service: String, action: String },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("cannot delete the last remaining profile")]
    CannotDeleteLastProfile,

    #[error("cannot delete active profile '{name}', switch to another profile first")]
    CannotDeleteActiveProfile { name: String },

    #[error("a profile named '{name}' already exists")]
    DuplicateProfile { name: String },

    /// The legacy message channel rejected the call or timed out
    #[error("legacy channel call '{method}' failed: {reason}")]
    ChannelFailure { method: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    pub fn decode(entity: EntityKind, key: impl Into<String>, reason: impl Into<String>) -> Self {
        SyncError::Decode {
            entity,
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: EntityKind, key: impl Into<String>) -> Self {
        SyncError::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Stable code used at the bridge boundary
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::StoreUnavailable { .. } => "store_unavailable",
            SyncError::SyncInProgress { .. } => "sync_in_progress",
            SyncError::Decode { .. } => "decode_error",
            SyncError::NoData { .. } => "no_data",
            SyncError::NotFound { .. } => "not_found",
            SyncError::UnknownService(_) => "unknown_service",
            SyncError::UnknownAction { .. } => "unknown_action",
            SyncError::InvalidArguments(_) => "invalid_arguments",
            SyncError::CannotDeleteLastProfile => "cannot_delete_last_profile",
            SyncError::CannotDeleteActiveProfile { .. } => "cannot_delete_active_profile",
            SyncError::DuplicateProfile { .. } => "duplicate_profile",
            SyncError::ChannelFailure { .. } => "channel_failure",
            SyncError::Database(_) | SyncError::Io(_) | SyncError::Serialization(_) => "io_error",
        }
    }

    /// Whether a caller may retry the same call later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::SyncInProgress { .. }
                | SyncError::ChannelFailure { .. }
                | SyncError::Database(_)
                | SyncError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(SyncError::CannotDeleteLastProfile.code(), "cannot_delete_last_profile");
        assert_eq!(
            SyncError::UnknownService("media".into()).code(),
            "unknown_service"
        );
        assert_eq!(
            SyncError::Io(std::io::Error::other("disk full")).code(),
            "io_error"
        );
    }

    #[test]
    fn test_retryable_classification() {
        let busy = SyncError::SyncInProgress {
            operation: "legacy_to_structured".into(),
            elapsed_ms: 12,
        };
        assert!(busy.is_retryable());
        assert!(!SyncError::CannotDeleteLastProfile.is_retryable());
        assert!(!SyncError::NoData {
            entity: EntityKind::AppSettings
        }
        .is_retryable());
    }

    #[test]
    fn test_decode_message_names_entity_and_key() {
        let err = SyncError::decode(EntityKind::Indexer, "host", "is missing");
        assert_eq!(err.to_string(), "cannot decode indexer: field 'host' is missing");
    }
}
