//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessToken, Credentials, Principal},
    password::PasswordHasher,
    token::TokenService,
};
use crate::db::{CredentialStore, StoreError};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Longest accepted email, per RFC 5321 path limits
pub const MAX_EMAIL_LEN: usize = 254;

/// Longest accepted password in bytes
pub const MAX_PASSWORD_LEN: usize = 1024;

/// Hashed once, then verified against when signin finds no identity
const DUMMY_PASSWORD: &str = "authgate-timing-equalizer";

/// Signup and signin orchestration
pub struct AuthManager {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
    dummy_hash: OnceCell<String>,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `store` - Credential store holding identities
    /// * `hasher` - Password hasher (work factor, pepper)
    /// * `tokens` - Token service used to issue access tokens on signin
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Register a new identity
    ///
    /// # Returns
    ///
    /// * `AuthResult<Principal>` - The stored identity without its hash
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Empty or malformed email, empty or oversized password
    /// * `AuthError::CredentialsTaken` - Email already registered
    /// * `AuthError::Store` - Any other store failure
    pub async fn signup(&self, credentials: Credentials) -> AuthResult<Principal> {
        let email = normalize_email(&credentials.email);
        validate_email(&email)?;
        validate_password(&credentials.password)?;

        let secret_hash = self.hash_blocking(credentials.password).await?;

        match self.store.create(&email, &secret_hash).await {
            Ok(identity) => {
                log::info!("Registered identity {}", identity.id);
                Ok(identity.into())
            }
            Err(StoreError::DuplicateIdentity) => Err(AuthError::CredentialsTaken),
            Err(e) => Err(AuthError::Store(e)),
        }
    }

    /// Verify credentials and issue an access token
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredentials` - Unknown email or wrong password; both
    ///   paths run exactly one password verification
    /// * `AuthError::Store` - Store failure during lookup
    pub async fn signin(&self, credentials: Credentials) -> AuthResult<AccessToken> {
        let email = normalize_email(&credentials.email);

        if credentials.password.len() > MAX_PASSWORD_LEN {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = self.store.find_by_email(&email).await?;

        let Some(identity) = identity else {
            // Pay the same verification cost as a wrong password
            let dummy = self.dummy_hash().await?.to_string();
            let _ = self.verify_blocking(credentials.password, dummy).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .verify_blocking(credentials.password, identity.secret_hash)
            .await?
        {
            return Err(AuthError::InvalidCredentials);
        }

        log::debug!("Issuing access token for identity {}", identity.id);
        self.tokens.issue(identity.id)
    }

    async fn dummy_hash(&self) -> AuthResult<&str> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.hash_blocking(DUMMY_PASSWORD.to_string()))
            .await?;
        Ok(hash.as_str())
    }

    async fn hash_blocking(&self, password: String) -> AuthResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {e}")))?
    }

    async fn verify_blocking(&self, password: String, hash: String) -> AuthResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {e}")))
    }
}

/// Canonical form used for uniqueness and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Validate email format
fn validate_email(email: &str) -> AuthResult<()> {
    if email.is_empty() {
        return Err(AuthError::Validation("email must not be empty".to_string()));
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(AuthError::Validation(format!(
            "email must be at most {MAX_EMAIL_LEN} characters"
        )));
    }

    let malformed = || AuthError::Validation("email must be a valid address".to_string());

    let (local, domain) = email.split_once('@').ok_or_else(malformed)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || email.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(malformed());
    }

    // Domain needs at least two non-empty labels
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(malformed());
    }

    Ok(())
}

/// Validate password shape
fn validate_password(password: &str) -> AuthResult<()> {
    if password.is_empty() {
        return Err(AuthError::Validation(
            "password must not be empty".to_string(),
        ));
    }

    if password.len() > MAX_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at most {MAX_PASSWORD_LEN} bytes"
        )));
    }

    Ok(())
}
