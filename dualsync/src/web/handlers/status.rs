use axum::{extract::State, response::Json};
use serde::Serialize;

use super::common::ApiResponse;
use crate::migration::MigrationState;
use crate::sync::SyncStatus;
use crate::web::AppState;

#[derive(Serialize)]
pub struct ServiceStatus {
    pub migration_state: MigrationState,
    pub sync: SyncStatus,
}

pub async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<ServiceStatus>> {
    Json(ApiResponse::success(ServiceStatus {
        migration_state: state.coordinator.state().await,
        sync: state.engine.status().await,
    }))
}
