//! # Authentication Errors
//!
//! The four rejection outcomes the pipeline can produce, each mapped onto a
//! fixed HTTP status and a stable machine-readable code. Every failure path
//! funnels through [`AuthError::into_response`], so clients always see the
//! same JSON body shape regardless of which stage rejected them.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use thiserror::Error;

use crate::models::ErrorResponse;

/// AuthError
///
/// * `BadCredentials` - login attempt with a wrong username or password (401).
/// * `InvalidToken` - a token was presented but is malformed, tampered with,
///   expired or of the wrong kind (401).
/// * `Unauthorized` - the caller authenticated fine but lacks the authority
///   the path requires (403). Deliberately distinct from the two 401 cases.
/// * `Unauthenticated` - a protected path was hit with no token at all (401).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    BadCredentials,
    #[error("Invalid or expired authentication token")]
    InvalidToken,
    #[error("Insufficient authority for this resource")]
    Unauthorized,
    #[error("Full authentication is required to access this resource")]
    Unauthenticated,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized => StatusCode::FORBIDDEN,
            AuthError::BadCredentials | AuthError::InvalidToken | AuthError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
        }
    }

    /// Stable code clients can branch on without parsing the message.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::BadCredentials => "BAD_CREDENTIALS",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        rejection(self.status(), self.code(), &self.to_string())
    }
}

/// Builds the structured rejection body used for every pipeline refusal,
/// including the 405 the login stage returns for non-POST login requests.
pub(crate) fn rejection(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ErrorResponse {
        status: status.as_u16(),
        error: code.to_string(),
        message: message.to_string(),
        timestamp: Utc::now(),
    };
    (status, Json(body)).into_response()
}
