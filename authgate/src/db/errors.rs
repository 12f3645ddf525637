//! Credential store error types.

use thiserror::Error;

/// Credential store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// An identity with this email already exists
    #[error("Duplicate identity")]
    DuplicateIdentity,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for credential store operations
pub type StoreResult<T> = Result<T, StoreError>;
