// Bridge façade endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use tracing::debug;

use super::common::status_for_code;
use crate::bridge::{BridgeRequest, BridgeResponse};
use crate::errors::SyncError;
use crate::web::AppState;

/// `POST /api/bridge` with `{service, action, arguments}`
pub async fn post_bridge_request(
    State(state): State<AppState>,
    Json(request): Json<BridgeRequest>,
) -> (StatusCode, Json<BridgeResponse>) {
    respond(state.bridge.handle(request).await)
}

/// `POST /api/{service}/{action}` with the arguments as the body. An empty
/// body means no arguments.
pub async fn post_service_action(
    Path((service, action)): Path<(String, String)>,
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<BridgeResponse>) {
    debug!("HTTP bridge call {}.{}", service, action);
    let arguments = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                return respond(BridgeResponse::err(&SyncError::InvalidArguments(
                    e.to_string(),
                )))
            }
        }
    };
    let request = BridgeRequest {
        service,
        action,
        arguments,
    };
    respond(state.bridge.handle(request).await)
}

fn respond(response: BridgeResponse) -> (StatusCode, Json<BridgeResponse>) {
    let status = response
        .error_code()
        .map(status_for_code)
        .unwrap_or(StatusCode::OK);
    (status, Json(response))
}
