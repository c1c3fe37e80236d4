//! # Authenticators
//!
//! The two seams the pipeline stages authenticate through. Both are object
//! safe so tests can swap in misbehaving fakes without touching the stages.

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    Principal,
    error::AuthError,
    token::{TokenService, TokenUse},
};
use crate::repository::RepositoryState;

/// Verifies a username/password pair and resolves the principal it belongs
/// to. Used exclusively by the login stage.
#[async_trait]
pub trait CredentialsAuthenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError>;
}

/// Verifies a bearer token and resolves the principal it encodes. Used
/// exclusively by the token stage.
#[async_trait]
pub trait TokenAuthenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;
}

/// DirectoryAuthenticator
///
/// Production credentials check against the user directory: look the account
/// up by username, verify the password against its bcrypt hash. Unknown
/// username and wrong password are indistinguishable to the caller.
pub struct DirectoryAuthenticator {
    repo: RepositoryState,
}

impl DirectoryAuthenticator {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CredentialsAuthenticator for DirectoryAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let user = self
            .repo
            .find_user(username)
            .await
            .ok_or(AuthError::BadCredentials)?;

        // verify() errors on a corrupt stored hash; that reads as a failed
        // login here and the repository layer has already logged the row.
        let matches = bcrypt::verify(password, &user.password_hash).unwrap_or(false);
        if !matches {
            return Err(AuthError::BadCredentials);
        }

        let authority = user.authority();
        Ok(Principal::new(user.username, vec![authority]))
    }
}

/// JwtAuthenticator
///
/// Production token check: decode and validate the JWT, then require the
/// `access` use. A refresh token is only good at the refresh endpoint and
/// never opens the protected API directly.
pub struct JwtAuthenticator {
    service: Arc<TokenService>,
}

impl JwtAuthenticator {
    pub fn new(service: Arc<TokenService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl TokenAuthenticator for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.service.decode(token)?;
        if claims.token_use != TokenUse::Access {
            tracing::debug!("rejected non-access token on protected path");
            return Err(AuthError::InvalidToken);
        }
        Ok(claims.principal())
    }
}
