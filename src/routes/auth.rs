use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Auth Router Module
///
/// The account endpoints that are classified as token-exempt by name:
/// registration and token refresh.
///
/// Deliberately absent: POST /api/auth/login. The credential login stage is
/// terminal on that path and answers before routing, so a route here would
/// be dead code that only suggests the handler is reachable.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // POST /api/auth/register
        // Creates a MEMBER account. 409 when the username is taken.
        .route("/api/auth/register", post(handlers::register_user))
        // POST /api/auth/token
        // Exchanges a refresh token (in X-Authorization) for a new access
        // token. The account is re-read from the directory on every refresh.
        .route("/api/auth/token", post(handlers::refresh_token))
}
