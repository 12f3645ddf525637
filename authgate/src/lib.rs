//! # authgate
//!
//! Credential-based authentication: registers users with Argon2id-hashed
//! passwords, verifies sign-in attempts, issues signed bearer tokens and
//! resolves the caller of protected requests from those tokens.
//!
//! ## Core Modules
//!
//! - [`auth`]: Password hashing, token service, signup/signin orchestration
//!   and the identity guard
//! - [`db`]: Credential store trait with PostgreSQL and in-memory backends
//!
//! The HTTP surface lives in the `ag_server` crate; everything here is
//! transport agnostic.

/// Authentication flows, tokens and the identity guard.
pub mod auth;
pub use auth::{AuthError, AuthManager, AuthResult, Credentials, IdentityGuard, Principal};

/// Credential persistence.
pub mod db;
pub use db::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
