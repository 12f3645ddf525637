//! Authentication: signup, signin, token issuance and the identity guard.
//!
//! This module implements:
//! - Argon2id password hashing with optional server-side pepper
//! - HS256 JWT access tokens (15-minute default expiry)
//! - Signup with duplicate detection and signin that does not reveal
//!   whether an email is registered
//! - A guard resolving `Authorization: Bearer <token>` to a [`Principal`]
//!
//! ## Example
//!
//! ```no_run
//! use authgate::auth::{AuthManager, Credentials, HashingParams, PasswordHasher, TokenService};
//! use authgate::db::MemoryCredentialStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryCredentialStore::new());
//!     let tokens = Arc::new(TokenService::new(b"jwt_secret", chrono::Duration::minutes(15)));
//!     let hasher = PasswordHasher::new(HashingParams::default(), None)?;
//!     let auth = AuthManager::new(store, hasher, tokens);
//!
//!     let user = auth.signup(Credentials::new("player@example.com", "secret123")).await?;
//!     println!("Registered user: {}", user.email);
//!
//!     let token = auth.signin(Credentials::new("player@example.com", "secret123")).await?;
//!     println!("Bearer {}", token.token);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod guard;
pub mod manager;
pub mod models;
pub mod password;
pub mod token;

pub use errors::{AuthError, AuthResult, TokenError};
pub use guard::{IdentityGuard, extract_bearer};
pub use manager::AuthManager;
pub use models::{AccessToken, AccessTokenClaims, Credentials, Identity, Principal, UserId};
pub use password::{HashingParams, PasswordHasher};
pub use token::{DEFAULT_TOKEN_TTL, TokenService};
