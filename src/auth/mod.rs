//! # Authentication Layer
//!
//! Everything the portal knows about identity lives in this module tree:
//!
//! * [`policy`] - the ordered access-rule table that classifies request paths.
//! * [`token`] - JWT claims, issuance and verification (`X-Authorization` header).
//! * [`provider`] - the authenticator traits plus their production implementations.
//! * [`middleware`] - the two fixed pipeline stages applied in front of the router.
//! * [`error`] - the authentication error taxonomy and its structured responses.
//!
//! The pieces are bundled into an [`AuthState`] that the router state carries.
//! All checks are stateless: every request is judged on its own headers, so no
//! session storage exists anywhere in the portal.

use std::{fmt, str::FromStr, sync::Arc};

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{config::AppConfig, repository::RepositoryState};

pub mod error;
pub mod middleware;
pub mod policy;
pub mod provider;
pub mod token;

pub use error::AuthError;
pub use policy::{AccessPolicy, PathClass};
pub use provider::{CredentialsAuthenticator, TokenAuthenticator};
pub use token::{Claims, TokenService, TokenUse};

/// Authority
///
/// The granted roles a principal can carry. Access decisions compare these
/// variants directly instead of matching on role strings, so a typo can no
/// longer silently open (or close) a route.
///
/// Serialized in token claims and API payloads as `"ADMIN"` / `"MEMBER"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Authority {
    Admin,
    Member,
}

impl Authority {
    /// The canonical storage/wire code for this authority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Authority::Admin => "ADMIN",
            Authority::Member => "MEMBER",
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Authority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Authority::Admin),
            "MEMBER" => Ok(Authority::Member),
            other => Err(format!("unknown authority code: {other}")),
        }
    }
}

/// Principal
///
/// The authenticated identity attached to a request once the token stage has
/// verified it. Handlers receive it through the extractor below; it carries no
/// credential material, only the username and the granted authorities.
#[derive(Debug, Clone)]
pub struct Principal {
    pub username: String,
    pub authorities: Vec<Authority>,
}

impl Principal {
    pub fn new(username: impl Into<String>, authorities: Vec<Authority>) -> Self {
        Self {
            username: username.into(),
            authorities,
        }
    }

    /// True when the principal carries the given authority.
    pub fn has_authority(&self, authority: Authority) -> bool {
        self.authorities.contains(&authority)
    }
}

/// Extractor that pulls the [`Principal`] the token stage stored in the
/// request extensions. Reaching a handler on a protected path without one
/// means the pipeline was bypassed, which is rejected as unauthenticated
/// rather than trusted.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

/// AuthState
///
/// The immutable bundle of collaborators the authentication pipeline needs.
/// Built once at startup from [`AppConfig`] and handed to the router state;
/// nothing in here is mutated afterwards.
#[derive(Clone)]
pub struct AuthState {
    /// Ordered access-rule table consulted by both pipeline stages.
    pub policy: Arc<AccessPolicy>,
    /// Verifies username/password pairs (login stage).
    pub credentials: Arc<dyn CredentialsAuthenticator>,
    /// Verifies bearer tokens (token stage).
    pub tokens: Arc<dyn TokenAuthenticator>,
    /// Issues new access/refresh tokens (login + refresh endpoints).
    pub issuer: Arc<TokenService>,
}

/// Wires the production [`AuthState`]: the canonical portal access policy, a
/// user-directory credentials authenticator and a JWT token authenticator,
/// all sharing one [`TokenService`] keyed from the configured secret.
pub fn build_auth_state(config: &AppConfig, repo: RepositoryState) -> AuthState {
    let issuer = Arc::new(TokenService::new(
        &config.jwt_secret,
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    ));

    AuthState {
        policy: Arc::new(AccessPolicy::new()),
        credentials: Arc::new(provider::DirectoryAuthenticator::new(repo)),
        tokens: Arc::new(provider::JwtAuthenticator::new(issuer.clone())),
        issuer,
    }
}
