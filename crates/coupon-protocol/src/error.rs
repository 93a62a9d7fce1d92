//! Protocol-level errors returned to the remote caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A JSON-RPC style error object.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message} ({code})")]
pub struct ProtocolError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProtocolError {
    /// The request envelope itself is malformed.
    pub const INVALID_REQUEST: i64 = -32600;

    /// A protected method was called without a valid coupon.
    pub const COUPON_REQUIRED: i64 = -32001;

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: "invalid request".to_string(),
            data: Some(Value::String(reason.into())),
        }
    }

    /// `-32001 valid coupon required`, optionally explaining which check failed.
    pub fn coupon_required(detail: Option<Value>) -> Self {
        Self {
            code: Self::COUPON_REQUIRED,
            message: "valid coupon required".to_string(),
            data: detail,
        }
    }
}
