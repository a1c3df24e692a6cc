use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

pub const MALFORMED_ENVELOPE: &str = "malformed_envelope";
pub const METHOD_NOT_FOUND: &str = "method_not_found";
pub const INVALID_ARGUMENTS: &str = "invalid_arguments";
pub const INTERNAL_ERROR: &str = "internal_error";

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("malformed envelope: {message}")]
    MalformedEnvelope { message: String },
    #[error("method not found: {method}")]
    MethodNotFound { method: String },
    #[error("{method} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },
    #[error("{method} argument {index} is invalid: {message}")]
    InvalidArgument {
        method: String,
        index: usize,
        message: String,
    },
    #[error("{method} failed: {message}")]
    TargetFailed { method: String, message: String },
    #[error("remote rejected arguments: {message}")]
    RemoteRejected { message: String },
    #[error("remote returned status {status}: {message}")]
    RemoteStatus { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("failed to encode arguments: {0}")]
    Encode(String),
}

/// Body of every non-200 response written by the dispatcher.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl RpcError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            message: message.into(),
        }
    }

    pub fn not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    pub fn target_failed(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TargetFailed {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Rebuilds the error a direct call would have produced from a dispatcher error body.
    pub fn from_error_response(status: u16, method: &str, body: ErrorResponse) -> Self {
        match body.code.as_str() {
            MALFORMED_ENVELOPE => {
                let detail = body
                    .message
                    .strip_prefix("malformed envelope: ")
                    .map(str::to_string)
                    .unwrap_or(body.message);
                Self::malformed(detail)
            }
            METHOD_NOT_FOUND => Self::not_found(method),
            INVALID_ARGUMENTS => Self::RemoteRejected {
                message: body.message,
            },
            INTERNAL_ERROR => Self::target_failed(method, body.message),
            _ => Self::RemoteStatus {
                status,
                message: body.message,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MethodNotFound { .. })
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            Self::MalformedEnvelope { .. } => (StatusCode::BAD_REQUEST, MALFORMED_ENVELOPE, json!({})),
            Self::MethodNotFound { method } => {
                (StatusCode::NOT_FOUND, METHOD_NOT_FOUND, json!({ "method": method }))
            }
            Self::ArityMismatch {
                method,
                expected,
                actual,
            } => (
                StatusCode::BAD_REQUEST,
                INVALID_ARGUMENTS,
                json!({ "method": method, "expected": expected, "actual": actual }),
            ),
            Self::InvalidArgument { method, index, .. } => (
                StatusCode::BAD_REQUEST,
                INVALID_ARGUMENTS,
                json!({ "method": method, "index": index }),
            ),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR, json!({})),
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed with internal error");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                code: code.to_string(),
                message,
                details,
            }),
        )
            .into_response()
    }
}
