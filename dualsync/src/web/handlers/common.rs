// Common types for API handlers

use axum::{http::StatusCode, response::Json};
use chrono::Utc;
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// HTTP status for a bridge error code
pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "not_found" | "no_data" => StatusCode::NOT_FOUND,
        "unknown_service" | "unknown_action" | "invalid_arguments" | "decode_error" => {
            StatusCode::BAD_REQUEST
        }
        "sync_in_progress"
        | "duplicate_profile"
        | "cannot_delete_last_profile"
        | "cannot_delete_active_profile" => StatusCode::CONFLICT,
        "store_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
        "channel_failure" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
