//! Credential store abstraction and its implementations.
//!
//! The auth manager and identity guard only see [`CredentialStore`], so the
//! PostgreSQL store and the in-memory store are interchangeable.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use crate::auth::{Identity, UserId};

/// Persistence for registered identities.
///
/// Implementations must make the duplicate check and the insert in
/// [`CredentialStore::create`] atomic: for one email, at most one concurrent
/// create succeeds.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new identity
    ///
    /// # Errors
    ///
    /// * `StoreError::DuplicateIdentity` - Email already registered
    async fn create(&self, email: &str, secret_hash: &str) -> StoreResult<Identity>;

    /// Find identity by email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    /// Find identity by ID
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<Identity>>;

    /// Check that the backing storage is reachable
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// PostgreSQL implementation of `CredentialStore`
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn identity_from_row(row: PgRow) -> Identity {
    Identity {
        id: row.get("id"),
        email: row.get("email"),
        secret_hash: row.get("hash"),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, email: &str, secret_hash: &str) -> StoreResult<Identity> {
        // The UNIQUE constraint on email makes check-and-insert a single atomic step
        let row = sqlx::query("INSERT INTO users (email, hash) VALUES ($1, $2) RETURNING id, email, hash")
            .bind(email)
            .bind(secret_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::DuplicateIdentity
                }
                other => StoreError::Database(other),
            })?;

        Ok(identity_from_row(row))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let row = sqlx::query("SELECT id, email, hash FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(identity_from_row))
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<Identity>> {
        let row = sqlx::query("SELECT id, email, hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(identity_from_row))
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(Default)]
struct MemoryTables {
    by_id: HashMap<UserId, Identity>,
    id_by_email: HashMap<String, UserId>,
    next_id: UserId,
}

/// In-process implementation of `CredentialStore`.
///
/// Everything sits behind one lock, so `create` holds the write lock across the
/// duplicate check and the insert. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<MemoryTables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities
    pub async fn len(&self) -> usize {
        self.tables.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, email: &str, secret_hash: &str) -> StoreResult<Identity> {
        let mut tables = self.tables.write().await;
        if tables.id_by_email.contains_key(email) {
            return Err(StoreError::DuplicateIdentity);
        }

        tables.next_id += 1;
        let identity = Identity {
            id: tables.next_id,
            email: email.to_string(),
            secret_hash: secret_hash.to_string(),
        };
        tables.id_by_email.insert(identity.email.clone(), identity.id);
        tables.by_id.insert(identity.id, identity.clone());

        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables
            .id_by_email
            .get(email)
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<Identity>> {
        Ok(self.tables.read().await.by_id.get(&id).cloned())
    }
}
