//! Integration tests for the HTTP API.
//!
//! Drives the full router (request ID layer, guard middleware, handlers and
//! error mapping) with `oneshot` requests against the in-memory store.

use ag_server::api::{AppState, create_router};
use async_trait::async_trait;
use authgate::auth::{HashingParams, Identity, PasswordHasher, TokenService, UserId};
use authgate::db::{CredentialStore, MemoryCredentialStore, StoreError, StoreResult};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

const JWT_SECRET: &[u8] = b"test_secret_key_for_testing_only_0123456789";

/// Helper to create the router plus the token service it signs with
fn create_test_server() -> (Router, Arc<TokenService>) {
    let store = Arc::new(MemoryCredentialStore::new());
    let hasher = PasswordHasher::new(HashingParams::minimal(), None).unwrap();
    let tokens = Arc::new(TokenService::new(JWT_SECRET, chrono::Duration::minutes(15)));

    let app = create_router(AppState::new(store, hasher, tokens.clone()));
    (app, tokens)
}

/// Credential store whose backing database is unreachable
struct UnreachableStore;

fn pool_timeout() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl CredentialStore for UnreachableStore {
    async fn create(&self, _email: &str, _secret_hash: &str) -> StoreResult<Identity> {
        Err(pool_timeout())
    }

    async fn find_by_email(&self, _email: &str) -> StoreResult<Option<Identity>> {
        Err(pool_timeout())
    }

    async fn find_by_id(&self, _id: UserId) -> StoreResult<Option<Identity>> {
        Err(pool_timeout())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Err(pool_timeout())
    }
}

fn create_unreachable_server() -> (Router, Arc<TokenService>) {
    let hasher = PasswordHasher::new(HashingParams::minimal(), None).unwrap();
    let tokens = Arc::new(TokenService::new(JWT_SECRET, chrono::Duration::minutes(15)));

    let app = create_router(AppState::new(Arc::new(UnreachableStore), hasher, tokens.clone()));
    (app, tokens)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn signup(app: &Router, email: &str, password: &str) -> Response {
    app.clone()
        .oneshot(post_json(
            "/auth/signup",
            json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap()
}

async fn signin(app: &Router, email: &str, password: &str) -> Response {
    app.clone()
        .oneshot(post_json(
            "/auth/signin",
            json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap()
}

/// Sign up and sign in, returning the bearer token
async fn token_for(app: &Router, email: &str, password: &str) -> String {
    assert_eq!(signup(app, email, password).await.status(), StatusCode::CREATED);
    let response = signin(app, email, password).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server();

    let response = app.oneshot(get_with_token("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], true);
}

// ============================================================================
// Signup Tests
// ============================================================================

#[tokio::test]
async fn test_signup_returns_created_identity() {
    let (app, _) = create_test_server();

    let response = signup(&app, "a@x.com", "secret123").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body, json!({ "id": 1, "email": "a@x.com" }));
}

#[tokio::test]
async fn test_signup_never_exposes_hash() {
    let (app, _) = create_test_server();

    let body = body_json(signup(&app, "a@x.com", "secret123").await).await;
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(!body.to_string().contains("argon2"));
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let (app, _) = create_test_server();

    assert_eq!(
        signup(&app, "a@x.com", "secret123").await.status(),
        StatusCode::CREATED
    );

    let response = signup(&app, "a@x.com", "other-password").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "CredentialsTaken");

    // Differs only in case and surrounding whitespace
    let response = signup(&app, "  A@X.com ", "secret123").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_signup_validation_errors() {
    let (app, _) = create_test_server();

    for (email, password) in [("", "secret123"), ("a@x.com", ""), ("not-an-email", "secret123")] {
        let response = signup(&app, email, password).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "email={email:?}");

        let body = body_json(response).await;
        assert_eq!(body["error"], "ValidationError");
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .method("POST")
        .uri("/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": \"a@x.com\""))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "ValidationError");

    let response = app
        .oneshot(post_json("/auth/signin", json!({ "email": "a@x.com" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Signin Tests
// ============================================================================

#[tokio::test]
async fn test_signin_returns_token() {
    let (app, tokens) = create_test_server();
    signup(&app, "a@x.com", "secret123").await;

    let response = signin(&app, "a@x.com", "secret123").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap();
    assert_eq!(tokens.validate(token), Ok(1));
}

#[tokio::test]
async fn test_signin_failures_are_indistinguishable() {
    let (app, _) = create_test_server();
    signup(&app, "a@x.com", "secret123").await;

    let wrong_password = signin(&app, "a@x.com", "wrong").await;
    let unknown_email = signin(&app, "nobody@x.com", "secret123").await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    let wrong_password = body_json(wrong_password).await;
    let unknown_email = body_json(unknown_email).await;
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password, json!({ "error": "InvalidCredentials" }));
}

// ============================================================================
// Protected Route Tests
// ============================================================================

#[tokio::test]
async fn test_me_returns_principal() {
    let (app, _) = create_test_server();
    let token = token_for(&app, "a@x.com", "secret123").await;

    let response = app
        .clone()
        .oneshot(get_with_token("/users/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "id": 1, "email": "a@x.com" }));

    let response = app
        .oneshot(get_with_token("/users/me/id", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "id": 1 }));
}

#[tokio::test]
async fn test_me_requires_token() {
    let (app, _) = create_test_server();

    let response = app
        .clone()
        .oneshot(get_with_token("/users/me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Unauthenticated");

    let request = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, "Basic YTpi")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_rejects_bad_tokens() {
    let (app, tokens) = create_test_server();
    let token = token_for(&app, "a@x.com", "secret123").await;

    let expired = tokens
        .issue_with_ttl(1, chrono::Duration::seconds(-60))
        .unwrap()
        .token;

    // Flip one character inside the signature
    let mut tampered = token.into_bytes();
    let pos = tampered.iter().rposition(|&b| b == b'.').unwrap() + 5;
    tampered[pos] = if tampered[pos] == b'x' { b'y' } else { b'x' };
    let tampered = String::from_utf8(tampered).unwrap();

    let foreign = TokenService::new(
        b"another_deployment_secret_0123456789abcdef",
        chrono::Duration::minutes(15),
    )
    .issue(1)
    .unwrap()
    .token;

    for token in [expired, tampered, foreign, "garbage".to_string()] {
        let response = app
            .clone()
            .oneshot(get_with_token("/users/me", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Unauthenticated" }));
    }
}

#[tokio::test]
async fn test_token_for_unknown_identity_rejected() {
    let (app, tokens) = create_test_server();

    // Valid signature, but no identity 42 exists
    let token = tokens.issue(42).unwrap().token;
    let response = app
        .oneshot(get_with_token("/users/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Request ID Tests
// ============================================================================

#[tokio::test]
async fn test_request_id_header() {
    let (app, _) = create_test_server();

    let response = app
        .clone()
        .oneshot(get_with_token("/health", None))
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-abc-123");
}

#[tokio::test]
async fn test_unknown_route_not_found() {
    let (app, _) = create_test_server();

    let response = app
        .oneshot(get_with_token("/nope", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Store Outage Tests
// ============================================================================

#[tokio::test]
async fn test_store_outage_is_opaque_internal_error() {
    let (app, tokens) = create_unreachable_server();
    let token = tokens.issue(1).unwrap().token;

    let responses = [
        signup(&app, "a@x.com", "secret123").await,
        signin(&app, "a@x.com", "secret123").await,
        app.clone()
            .oneshot(get_with_token("/users/me", Some(&token)))
            .await
            .unwrap(),
    ];

    for response in responses {
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({ "error": "InternalError" }));
    }
}

#[tokio::test]
async fn test_health_check_reports_store_outage() {
    let (app, _) = create_unreachable_server();

    let response = app.oneshot(get_with_token("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["store"], false);
}

#[tokio::test]
async fn test_unknown_paths_skip_the_guard() {
    let (app, _) = create_test_server();

    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/signupx",
            json!({ "email": "a@x.com", "password": "secret123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get_with_token("/users/me/extra", Some("garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
