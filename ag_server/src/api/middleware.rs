//! Authentication middleware for protected endpoints.
//!
//! [`require_auth`] runs the identity guard once per request and stores the
//! resolved [`Principal`] in request extensions. Handlers then pick what they
//! need with the [`CurrentUser`] or [`CurrentUserId`] extractors, neither of
//! which validates the token again.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, middleware};
//! use ag_server::api::{AppState, middleware::{require_auth, CurrentUserId}};
//! # let state: AppState = unimplemented!();
//!
//! async fn handler(CurrentUserId(user_id): CurrentUserId) -> String {
//!     format!("Authenticated as user {}", user_id)
//! }
//!
//! let protected_routes: Router<AppState> = Router::new()
//!     .route("/protected", get(handler))
//!     .layer(middleware::from_fn_with_state(state, require_auth));
//! # let _ = protected_routes;
//! ```

use authgate::auth::{AuthError, Principal, UserId};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use super::{AppState, error::ApiError};
use crate::metrics;

/// Reject the request with `401 Unauthenticated` unless it carries a valid
/// `Authorization: Bearer <token>` header for an existing identity.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let principal = state
        .guard
        .authenticate(authorization)
        .await
        .inspect_err(|err| {
            if !err.is_internal() {
                metrics::guard_rejections_total();
                tracing::debug!(reason = %err, "Guard rejected request");
            }
        })?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

/// Only the authenticated caller's ID
#[derive(Debug, Clone, Copy)]
pub struct CurrentUserId(pub UserId);

fn principal_from(parts: &Parts) -> Result<&Principal, ApiError> {
    // Missing means the route is not behind `require_auth`: fail closed
    parts
        .extensions
        .get::<Principal>()
        .ok_or(ApiError::Auth(AuthError::Unauthenticated))
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from(parts).cloned().map(CurrentUser)
    }
}

impl<S> FromRequestParts<S> for CurrentUserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from(parts).map(|principal| CurrentUserId(principal.id))
    }
}
