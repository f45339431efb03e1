// File: dualsync/src/sync/summary.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::operation_tracker::ActiveOperation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    LegacyToStructured,
    StructuredToLegacy,
    SingleProfile,
}

/// Outcome of one successful sync pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub direction: SyncDirection,
    pub profiles_created: usize,
    pub profiles_updated: usize,
    pub indexers_created: usize,
    pub indexers_updated: usize,
    pub settings_synced: bool,
    pub completed_at: DateTime<Utc>,
}

impl SyncSummary {
    pub fn new(direction: SyncDirection) -> Self {
        Self {
            direction,
            profiles_created: 0,
            profiles_updated: 0,
            indexers_created: 0,
            indexers_updated: 0,
            settings_synced: false,
            completed_at: Utc::now(),
        }
    }

    pub fn records_created(&self) -> usize {
        self.profiles_created + self.indexers_created
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub active_operation: Option<ActiveOperation>,
    pub last_summary: Option<SyncSummary>,
}
