//! Database record types (rows of the structured store).
//!
//! Collections are stored as JSON text columns, the same way list-valued
//! configuration is kept elsewhere in this schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Surrogate identity and timestamps the store assigns to a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIdentity {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordIdentity {
    pub fn fresh() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Keep id and creation time, bump the modification time
    pub fn touched(&self) -> Self {
        Self {
            id: self.id.clone(),
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}

// ============================================================================
// Profiles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    pub name: String,
    pub is_enabled: bool,
    pub wol_enabled: bool,
    pub wol_mac_address: String,
    pub wol_broadcast_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row per (profile, service)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub profile_id: String,
    pub service: String,
    pub enabled: bool,
    pub host: String,
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub custom_headers: String, // JSON object
    pub strict_tls: bool,
}

/// A profile row together with its service rows
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredProfile {
    pub record: ProfileRecord,
    pub services: Vec<ServiceRecord>,
}

// ============================================================================
// Settings and indexers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub id: String,
    pub enabled_profile: String,
    pub theme_amoled: bool,
    pub theme_amoled_border: bool,
    pub theme_image_background_opacity: i64,
    pub drawer_automatic_manage: bool,
    pub drawer_manual_order: String, // JSON array
    pub quick_actions: String,       // JSON object
    pub networking_tls_validation: bool,
    pub use_24_hour_time: bool,
    pub enable_in_app_notifications: bool,
    pub changelog_last_build_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerRecord {
    pub id: String,
    pub display_name: String,
    pub host: String,
    pub api_key: String,
    pub custom_headers: String, // JSON object
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Metadata
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
