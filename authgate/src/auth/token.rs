//! Signed, time-bounded access tokens (HS256 JWT).

use super::{
    errors::{AuthError, AuthResult, TokenError},
    models::{AccessToken, AccessTokenClaims, UserId},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

/// Default access token lifetime
pub const DEFAULT_TOKEN_TTL: Duration = Duration::minutes(15);

/// Issues and validates access tokens.
///
/// Holds the process-wide signing key. The key is fixed at construction and the
/// service has no interior mutability, so one instance is shared behind an `Arc`.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service
    ///
    /// # Arguments
    ///
    /// * `secret` - HMAC signing secret
    /// * `ttl` - Lifetime of tokens produced by [`TokenService::issue`]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Issue a token for `subject` with the configured lifetime
    pub fn issue(&self, subject: UserId) -> AuthResult<AccessToken> {
        self.issue_with_ttl(subject, self.ttl)
    }

    /// Issue a token for `subject` that expires `ttl` from now
    ///
    /// # Errors
    ///
    /// * `AuthError::Internal` - Expiry falls outside the representable date
    ///   range, or signing failed
    pub fn issue_with_ttl(&self, subject: UserId, ttl: Duration) -> AuthResult<AccessToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Internal(format!("token lifetime {ttl} out of range")))?;

        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;

        Ok(AccessToken { token })
    }

    /// Validate a token and return its subject.
    ///
    /// The signature is checked before any claim. A token is live while
    /// `now < exp`.
    pub fn validate(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        data.claims.sub.parse().map_err(|_| TokenError::Invalid)
    }
}
