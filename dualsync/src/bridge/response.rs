// File: dualsync/src/bridge/response.rs
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::SyncError;

/// Transport-neutral outcome of one bridge call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BridgeError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl BridgeResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: &SyncError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(BridgeError::from(error)),
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}

impl From<&SyncError> for BridgeError {
    fn from(error: &SyncError) -> Self {
        let mut details = Map::new();
        details.insert("retryable".to_string(), json!(error.is_retryable()));
        match error {
            SyncError::Decode { entity, key, .. } | SyncError::NotFound { entity, key } => {
                details.insert("entity".to_string(), json!(entity.to_string()));
                details.insert("key".to_string(), json!(key));
            }
            SyncError::NoData { entity } => {
                details.insert("entity".to_string(), json!(entity.to_string()));
            }
            SyncError::SyncInProgress {
                operation,
                elapsed_ms,
            } => {
                details.insert("operation".to_string(), json!(operation));
                details.insert("elapsed_ms".to_string(), json!(elapsed_ms));
            }
            SyncError::ChannelFailure { method, .. } => {
                details.insert("method".to_string(), json!(method));
            }
            _ => {}
        }

        Self {
            code: error.code().to_string(),
            message: error.to_string(),
            details: Some(Value::Object(details)),
        }
    }
}
