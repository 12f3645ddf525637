//! Authentication data models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User ID type
pub type UserId = i64;

/// Stored identity record.
///
/// Owned by the credential store. Not `Serialize`, so the hash cannot end up
/// in a response body by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub secret_hash: String,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("secret_hash", &"<redacted>")
            .finish()
    }
}

impl From<Identity> for Principal {
    fn from(identity: Identity) -> Self {
        Principal {
            id: identity.id,
            email: identity.email,
        }
    }
}

/// Authenticated caller, as seen by request handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
}

/// Signup / signin input
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// JWT claims for access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String, // User ID, decimal
    pub iat: i64,    // Issued at timestamp
    pub exp: i64,    // Expiration timestamp
}

/// Signed bearer token returned by signin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
}
