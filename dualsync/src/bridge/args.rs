// File: dualsync/src/bridge/args.rs
use serde::Deserialize;

use crate::services::ProfilePatch;

#[derive(Debug, Clone, Deserialize)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameArgs {
    pub name: String,
}

/// `id` plus any profile fields to change
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileArgs {
    pub id: String,
    #[serde(flatten)]
    pub patch: ProfilePatch,
}
