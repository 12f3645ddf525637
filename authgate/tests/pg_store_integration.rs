//! Integration tests for the PostgreSQL credential store.
//!
//! Require a running database; run with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use authgate::db::{CredentialStore, Database, DatabaseConfig, StoreError};
use std::sync::Arc;

/// Helper to create a test database with the schema applied
async fn setup_test_db() -> Database {
    let config = DatabaseConfig {
        max_connections: 20,
        min_connections: 1,
        ..DatabaseConfig::from_env()
    };

    let db = Database::new(&config)
        .await
        .expect("Failed to create test database");
    db.ensure_schema().await.expect("Failed to apply schema");
    db
}

/// Unique email per test run so reruns don't collide
fn unique_email(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}_{nanos}@example.com")
}

async fn cleanup(db: &Database, email: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(db.pool())
        .await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_pg_create_and_find() {
    let db = setup_test_db().await;
    let store = db.credential_store();
    let email = unique_email("create");

    let created = store.create(&email, "hash-value").await.unwrap();
    assert!(created.id > 0, "User ID should be positive");

    let by_email = store.find_by_email(&email).await.unwrap().unwrap();
    let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(by_email, created);
    assert_eq!(by_id, created);
    assert!(store.health_check().await.is_ok());

    cleanup(&db, &email).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_pg_duplicate_email() {
    let db = setup_test_db().await;
    let store = db.credential_store();
    let email = unique_email("dup");

    store.create(&email, "first").await.unwrap();
    let result = store.create(&email, "second").await;
    assert!(matches!(result, Err(StoreError::DuplicateIdentity)));

    cleanup(&db, &email).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires PostgreSQL"]
async fn test_pg_concurrent_creates_single_winner() {
    let db = setup_test_db().await;
    let store = Arc::new(db.credential_store());
    let email = unique_email("race");

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..10 {
        let store = store.clone();
        let email = email.clone();
        tasks.spawn(async move { store.create(&email, &format!("hash-{i}")).await });
    }

    let mut created = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => created += 1,
            Err(StoreError::DuplicateIdentity) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(created, 1);

    cleanup(&db, &email).await;
}
