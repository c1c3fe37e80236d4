//! # Pipeline Stages
//!
//! The two middleware stages that make up the portal's fixed authentication
//! pipeline. Both are installed unconditionally in front of the whole router
//! and decide internally, via the shared [`AccessPolicy`], whether a request
//! concerns them:
//!
//! 1. **Credential login stage** - terminal on the login path. It consumes
//!    the request there and responds itself (token pair or rejection); no
//!    axum route exists for login. Every other path passes through untouched.
//! 2. **Token stage** - skips exempt paths, otherwise demands a valid access
//!    token in `X-Authorization`, checks the required authority and attaches
//!    the [`Principal`] to the request extensions for handlers downstream.
//!
//! Stage order matters only for the login path (the login stage must see it
//! first); for every other path exactly one stage acts.

use axum::{
    Json,
    body,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{
    Principal,
    error::{self, AuthError},
    policy::PathClass,
    token::{TokenUse, extract_token},
};
use crate::{
    AppState,
    models::{LoginRequest, TokenPair},
};

/// Upper bound on a login request body. Credentials fit in a fraction of
/// this; anything larger is cut off and treated as a failed login.
const LOGIN_BODY_LIMIT: usize = 16 * 1024;

/// Stage 1: credential login.
///
/// Terminal on [`PathClass::Login`] paths, a no-op everywhere else. Only POST
/// is served; other methods get a structured 405. A body that cannot be read
/// or parsed is rejected as bad credentials, the same as a wrong password.
pub async fn credential_login_stage(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if state.auth.policy.classify(req.uri().path()) != PathClass::Login {
        return next.run(req).await;
    }

    if req.method() != Method::POST {
        return error::rejection(
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            "Login requires POST",
        );
    }

    let body = req.into_body();
    let bytes = match body::to_bytes(body, LOGIN_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => return AuthError::BadCredentials.into_response(),
    };
    let login: LoginRequest = match serde_json::from_slice(&bytes) {
        Ok(login) => login,
        Err(_) => return AuthError::BadCredentials.into_response(),
    };

    match state
        .auth
        .credentials
        .authenticate(&login.username, &login.password)
        .await
    {
        Ok(principal) => issue_token_pair(&state, &principal),
        Err(err) => {
            tracing::info!(username = %login.username, "login rejected");
            err.into_response()
        }
    }
}

/// Mints the access/refresh pair for a freshly authenticated principal.
fn issue_token_pair(state: &AppState, principal: &Principal) -> Response {
    let access = state.auth.issuer.issue(principal, TokenUse::Access);
    let refresh = state.auth.issuer.issue(principal, TokenUse::Refresh);
    match (access, refresh) {
        (Ok(token), Ok(refresh_token)) => {
            tracing::info!(username = %principal.username, "login succeeded");
            Json(TokenPair {
                token,
                refresh_token,
            })
            .into_response()
        }
        (Err(err), _) | (_, Err(err)) => {
            tracing::error!("token issuance failed: {:?}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Stage 2: token authentication.
///
/// Skips token-exempt paths entirely. For protected paths the request only
/// reaches the router once a valid access token was presented and its
/// principal carries the authority the policy demands; a 404 for an unknown
/// protected path is therefore only ever seen by authenticated admins.
pub async fn token_auth_stage(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if state.auth.policy.is_token_exempt(&path) {
        return next.run(req).await;
    }

    let Some(token) = extract_token(req.headers()).map(str::to_owned) else {
        return AuthError::Unauthenticated.into_response();
    };

    let principal = match state.auth.tokens.authenticate(&token).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    if let Some(required) = state.auth.policy.required_authority(&path) {
        if !principal.has_authority(required) {
            tracing::info!(
                username = %principal.username,
                authority = %required,
                path = %path,
                "authenticated principal lacks required authority"
            );
            return AuthError::Unauthorized.into_response();
        }
    }

    req.extensions_mut().insert(principal);
    next.run(req).await
}
