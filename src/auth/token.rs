//! # Token Service
//!
//! JWT issuance and verification. Tokens travel in the custom
//! `X-Authorization` header rather than the standard `Authorization` header:
//! the portal's reverse proxy consumes the standard one, and keeping the
//! custom name also stops browsers from replaying cached Basic credentials.
//!
//! Two token kinds share one signing key and claim shape, separated by a
//! `token_use` claim: short-lived `access` tokens open the protected API,
//! longer-lived `refresh` tokens are only good for minting a new access
//! token at the refresh endpoint.

use axum::http::HeaderMap;
use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use super::{Authority, Principal, error::AuthError};

/// Header carrying the bearer token. Lowercase so it can be used directly as
/// an axum [`HeaderMap`] key.
pub const AUTH_HEADER: &str = "x-authorization";

/// Which purpose a token was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// Claims
///
/// The JWT payload. `sub` is the username; `authorities` are the roles that
/// were granted when the token was minted. Verification is stateless, so a
/// role change only takes effect once the client refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub authorities: Vec<Authority>,
    pub token_use: TokenUse,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    /// The principal these claims describe.
    pub fn principal(&self) -> Principal {
        Principal::new(self.sub.clone(), self.authorities.clone())
    }
}

/// TokenService
///
/// Issues and verifies the portal's JWTs with a single HMAC secret. Built
/// once at startup and shared behind an `Arc`; holds no mutable state.
pub struct TokenService {
    secret: String,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self {
            secret: secret.to_string(),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Mints a signed token for the principal with the TTL configured for the
    /// requested use.
    pub fn issue(
        &self,
        principal: &Principal,
        token_use: TokenUse,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let ttl = match token_use {
            TokenUse::Access => self.access_ttl_secs,
            TokenUse::Refresh => self.refresh_ttl_secs,
        };
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: principal.username.clone(),
            authorities: principal.authorities.clone(),
            token_use,
            iat: now,
            exp: now + ttl as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Verifies signature and expiry and returns the claims. Every failure
    /// collapses into [`AuthError::InvalidToken`]; the precise reason is only
    /// logged, never leaked to the client.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        // Ensure expiration time validation is always active.
        validation.validate_exp = true;

        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => Ok(data.claims),
            Err(err) => {
                match err.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                    kind => tracing::debug!("rejected token: {:?}", kind),
                }
                Err(AuthError::InvalidToken)
            }
        }
    }
}

/// Pulls the raw token out of the `X-Authorization` header, if present.
/// Tolerates an optional `Bearer ` prefix; an empty or non-UTF-8 header value
/// counts as absent.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTH_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.strip_prefix("Bearer ").unwrap_or(value))
}
