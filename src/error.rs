//! Error types for the security core
//!
//! Every failure produced by this crate falls into exactly one class. The
//! class decides what a caller may tell the end user and whether a retry
//! makes sense, so code that converts between classes must do so on purpose
//! (see [`CoreError::into_authentication`]).

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that can occur while authenticating or authorizing a request
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing, bad, or expired credentials. Always safe to answer with a
    /// generic "please log in again".
    #[error("authentication error: {reason}")]
    Authentication { reason: String },

    /// The credentials are valid but the principal lacks the privilege, or
    /// the principal is locked.
    #[error("authorization error: {reason}")]
    Authorization { reason: String },

    /// A whole authentication mode is disabled server-side.
    #[error("not supported: {details}")]
    NotSupported { details: String },

    /// An entity does not exist
    #[error("{kind} {id:?} not found")]
    NotFound { kind: &'static str, id: String },

    /// An entity already exists or is in a conflicting state
    #[error("{kind} {id:?} conflict: {reason}")]
    Conflict {
        kind: &'static str,
        id: String,
        reason: String,
    },

    /// The request itself is malformed
    #[error("bad request: {reason}")]
    BadRequest { reason: String },

    /// A dependency (store, identity provider) failed for reasons unrelated
    /// to the credential itself.
    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl CoreError {
    pub fn authentication(reason: impl Into<String>) -> Self {
        CoreError::Authentication {
            reason: reason.into(),
        }
    }

    pub fn authorization(reason: impl Into<String>) -> Self {
        CoreError::Authorization {
            reason: reason.into(),
        }
    }

    pub fn not_supported(details: impl Into<String>) -> Self {
        CoreError::NotSupported {
            details: details.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn conflict(kind: &'static str, id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Conflict {
            kind,
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        CoreError::BadRequest {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, CoreError::Authentication { .. })
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, CoreError::Authorization { .. })
    }

    /// Converts a not-found into an authentication failure carrying
    /// `reason`, so that callers can't probe whether an entity exists.
    /// Every other class passes through untouched.
    pub fn into_authentication(self, reason: &str) -> Self {
        match self {
            CoreError::NotFound { .. } => CoreError::authentication(reason),
            other => other,
        }
    }

    /// Attaches context to an internal error. Other classes already carry a
    /// caller-facing message and pass through untouched.
    pub fn context<C>(self, context: C) -> Self
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        match self {
            CoreError::Internal(e) => CoreError::Internal(e.context(context)),
            other => other,
        }
    }

    /// HTTP status code for this class of error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            CoreError::Authorization { .. } => StatusCode::FORBIDDEN,
            CoreError::NotSupported { .. } => StatusCode::NOT_IMPLEMENTED,
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::Conflict { .. } => StatusCode::CONFLICT,
            CoreError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Internal(err)
    }
}

/// Result type for security core operations
pub type Result<T> = std::result::Result<T, CoreError>;
