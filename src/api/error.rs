//! Structured API error responses with error codes
//!
//! Maps [`CoreError`] classes onto stable, machine-readable codes. Internal
//! errors are logged in full and answered with a generic message.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::CoreError;

// ============================================================================
// Error Codes
// ============================================================================

/// Error codes for API responses
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    /// Missing, invalid or expired credentials
    AuthRequired,
    /// Valid credentials, insufficient privilege or locked principal
    Forbidden,
    /// The authentication mode is disabled on this server
    NotSupported,

    // Validation errors (3xxx)
    /// The request is malformed
    BadRequest,

    // Resource errors (4xxx)
    /// Requested resource not found
    ResourceNotFound,

    // Conflict errors (5xxx)
    /// Resource already exists or is in a conflicting state
    Conflict,

    // Infrastructure errors (8xxx)
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn numeric_code(&self) -> u32 {
        match self {
            ErrorCode::AuthRequired => 1001,
            ErrorCode::Forbidden => 1002,
            ErrorCode::NotSupported => 1003,
            ErrorCode::BadRequest => 3001,
            ErrorCode::ResourceNotFound => 4001,
            ErrorCode::Conflict => 5001,
            ErrorCode::InternalError => 8999,
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::AuthRequired => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotSupported => StatusCode::NOT_IMPLEMENTED,
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotSupported => "NOT_SUPPORTED",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Structured Error Response
// ============================================================================

/// Structured error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code for easy categorization
    pub numeric_code: u32,

    /// Human-readable error message
    pub message: String,

    /// Kind and id of the entity involved, for not-found and conflict errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                numeric_code: code.numeric_code(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.error.code;
        let mut response = (status, Json(self)).into_response();

        // Add error code header for easier debugging
        response.headers_mut().insert(
            HeaderName::from_static("x-error-code"),
            HeaderValue::from_static(code.as_str()),
        );

        response
    }
}

// ============================================================================
// Conversion from CoreError
// ============================================================================

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { reason } => ApiError::new(ErrorCode::AuthRequired, reason),
            CoreError::Authorization { reason } => ApiError::new(ErrorCode::Forbidden, reason),
            CoreError::NotSupported { details } => ApiError::new(ErrorCode::NotSupported, details),
            CoreError::BadRequest { reason } => ApiError::new(ErrorCode::BadRequest, reason),
            CoreError::NotFound { kind, id } => ApiError::new(
                ErrorCode::ResourceNotFound,
                format!("{kind} {id:?} not found"),
            )
            .with_details(serde_json::json!({ "kind": kind, "id": id })),
            CoreError::Conflict { kind, id, reason } => {
                ApiError::new(ErrorCode::Conflict, reason)
                    .with_details(serde_json::json!({ "kind": kind, "id": id }))
            }
            CoreError::Internal(e) => {
                error!(error = %format!("{e:#}"), "internal error");
                ApiError::new(ErrorCode::InternalError, "internal server error")
            }
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================
