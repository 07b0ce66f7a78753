//! Error types and API error codes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filegate_core::CoreError;
use serde_json::json;
use thiserror::Error;

/// API error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    AccessDenied,
    EntityTooLarge,
    InternalError,
    InvalidArgument,
    NoSuchKey,
    SlowDown,
    StorageUnavailable,
    TooManyParts,
    Unauthorized,
}

impl ErrorCode {
    /// Get the error code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::EntityTooLarge => "EntityTooLarge",
            Self::InternalError => "InternalError",
            Self::InvalidArgument => "InvalidArgument",
            Self::NoSuchKey => "NoSuchKey",
            Self::SlowDown => "SlowDown",
            Self::StorageUnavailable => "StorageUnavailable",
            Self::TooManyParts => "TooManyParts",
            Self::Unauthorized => "Unauthorized",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::EntityTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidArgument | Self::TooManyParts => StatusCode::BAD_REQUEST,
            Self::NoSuchKey => StatusCode::NOT_FOUND,
            Self::SlowDown => StatusCode::TOO_MANY_REQUESTS,
            Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Api { code: ErrorCode, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Api { code, .. } => *code,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Core(e) if e.is_invalid_input() => ErrorCode::InvalidArgument,
            Self::Core(CoreError::ObjectNotFound { .. }) => ErrorCode::NoSuchKey,
            Self::Core(_) => ErrorCode::StorageUnavailable,
        }
    }

    /// Message safe to show to clients; storage internals stay in the logs
    pub fn public_message(&self) -> String {
        match self {
            Self::Core(CoreError::Storage(_)) => "Object storage is unavailable".to_string(),
            Self::Core(CoreError::ObjectNotFound { .. }) => "File not found".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let status = code.status_code();

        if status.is_server_error() {
            tracing::error!(code = code.as_str(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = code.as_str(), error = %self, "Request rejected");
        }

        let body = json!({
            "code": code.as_str(),
            "message": self.public_message(),
        });

        (status, [("x-error-code", code.as_str())], Json(body)).into_response()
    }
}
