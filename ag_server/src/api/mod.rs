//! HTTP API for the authentication server.
//!
//! # Modules
//!
//! - [`auth`]: Signup and signin
//! - [`users`]: The authenticated caller's own account
//! - [`middleware`]: Identity guard middleware and principal extractors
//! - [`request_id`]: Request correlation, request logs and HTTP metrics
//! - [`error`]: Mapping of auth errors onto status codes and JSON bodies
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health          - Health check (public)
//! POST /auth/signup     - Register identity (public)
//! POST /auth/signin     - Obtain bearer token (public)
//! GET  /users/me        - Caller's principal (auth required)
//! GET  /users/me/id     - Caller's ID only (auth required)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ag_server::api::{create_router, AppState};
//! use authgate::auth::{HashingParams, PasswordHasher, TokenService};
//! use authgate::db::MemoryCredentialStore;
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let state = AppState::new(
//!     Arc::new(MemoryCredentialStore::new()),
//!     PasswordHasher::new(HashingParams::default(), None)?,
//!     Arc::new(TokenService::new(b"jwt_secret", chrono::Duration::minutes(15))),
//! );
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. Restrict origins in front of the server
//! for production deployments.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod request_id;
pub mod users;

use authgate::{
    auth::{AuthManager, IdentityGuard, PasswordHasher, TokenService},
    db::CredentialStore,
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub guard: Arc<IdentityGuard>,
    pub store: Arc<dyn CredentialStore>,
}

impl AppState {
    /// Wire the auth manager and the identity guard to one store and one
    /// token service
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            auth_manager: Arc::new(AuthManager::new(store.clone(), hasher, tokens.clone())),
            guard: Arc::new(IdentityGuard::new(tokens, store.clone())),
            store,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin));

    let protected_routes = Router::new()
        .route("/users/me", get(users::me))
        .route("/users/me/id", get(users::my_id))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the credential store answers, `503 Service
/// Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","store":true,"version":"0.1.0","timestamp":"2026-01-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match state.store.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Credential store health check failed");
            false
        }
    };

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
