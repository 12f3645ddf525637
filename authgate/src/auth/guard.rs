//! Bearer token guard for protected requests.

use super::{
    errors::{AuthError, AuthResult},
    models::Principal,
    token::TokenService,
};
use crate::db::CredentialStore;
use std::sync::Arc;

/// Resolves the caller of a protected request from its `Authorization` header
pub struct IdentityGuard {
    tokens: Arc<TokenService>,
    store: Arc<dyn CredentialStore>,
}

impl IdentityGuard {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn CredentialStore>) -> Self {
        Self { tokens, store }
    }

    /// Authenticate a request from its raw `Authorization` header value
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthenticated` - Header missing or malformed, token
    ///   invalid or expired, or the subject no longer exists
    /// * `AuthError::Store` - Store failure during the identity lookup
    pub async fn authenticate(&self, authorization: Option<&str>) -> AuthResult<Principal> {
        let token = extract_bearer(authorization).ok_or(AuthError::Unauthenticated)?;

        let subject = self.tokens.validate(token).map_err(|e| {
            log::debug!("Rejected bearer token: {e}");
            AuthError::Unauthenticated
        })?;

        match self.store.find_by_id(subject).await? {
            Some(identity) => Ok(identity.into()),
            None => {
                log::debug!("Token subject {subject} has no identity");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively; an empty token or one containing
/// whitespace is treated as absent.
pub fn extract_bearer(authorization: Option<&str>) -> Option<&str> {
    let (scheme, token) = authorization?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }

    Some(token)
}
