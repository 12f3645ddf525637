//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;

/// Token validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Bad signature, malformed structure, wrong algorithm or missing claims
    #[error("Token invalid")]
    Invalid,

    /// Signature is valid but `exp` has passed
    #[error("Token expired")]
    Expired,
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed signup or signin input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Signup with an email that is already registered
    #[error("Credentials taken")]
    CredentialsTaken,

    /// Unknown email or wrong password; the two cases are never distinguished
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Token rejected by the token service
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Guard rejection: missing header, bad token, or unknown subject
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Credential store failure other than a duplicate
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    /// Token signing or a blocking task failed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable name of the error kind, used as the `error` field of API responses
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "ValidationError",
            AuthError::CredentialsTaken => "CredentialsTaken",
            AuthError::InvalidCredentials => "InvalidCredentials",
            AuthError::Token(TokenError::Invalid) => "TokenInvalid",
            AuthError::Token(TokenError::Expired) => "TokenExpired",
            AuthError::Unauthenticated => "Unauthenticated",
            AuthError::HashingFailed | AuthError::Store(_) | AuthError::Internal(_) => {
                "InternalError"
            }
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Store, hashing and internal errors are collapsed into a generic message so
    /// that database details and key material never reach the caller.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::HashingFailed | AuthError::Store(_) | AuthError::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Whether this error is outside the authentication taxonomy
    pub fn is_internal(&self) -> bool {
        self.kind() == "InternalError"
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
