//! Authentication API handlers.
//!
//! This module provides the two public HTTP endpoints of the auth core:
//! - Signup with email and password
//! - Signin returning a bearer token
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:3000/auth/signup \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "a@x.com", "password": "secret123"}'
//! ```
//!
//! Sign in:
//! ```bash
//! curl -X POST http://localhost:3000/auth/signin \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "a@x.com", "password": "secret123"}'
//! ```

use authgate::auth::{AccessToken, AuthError, Credentials, Principal};
use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};

use super::{AppState, error::ApiError};
use crate::{
    logging::log_security_event,
    metrics::{self, SigninOutcome, SignupOutcome},
};

/// Register a new identity.
///
/// # Request Body
///
/// ```json
/// { "email": "a@x.com", "password": "secret123" }
/// ```
///
/// # Response
///
/// On success, returns `201 Created` with the stored identity minus its hash:
/// ```json
/// { "id": 1, "email": "a@x.com" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: malformed JSON, empty fields, or invalid email
/// - `409 Conflict`: `{"error": "CredentialsTaken"}`
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<Principal>), ApiError> {
    let result = match payload {
        Ok(Json(credentials)) => state
            .auth_manager
            .signup(credentials)
            .await
            .map_err(ApiError::from),
        Err(rejection) => Err(rejection.into()),
    };

    match result {
        Ok(principal) => {
            metrics::signup_total(SignupOutcome::Created);
            tracing::info!(user_id = principal.id, "Identity registered");
            Ok((StatusCode::CREATED, Json(principal)))
        }
        Err(err) => {
            let outcome = signup_outcome(&err);
            if outcome == SignupOutcome::Taken {
                log_security_event("signup_duplicate", None, "Signup for registered email");
            }
            metrics::signup_total(outcome);
            Err(err)
        }
    }
}

/// Verify credentials and issue a bearer token.
///
/// # Response
///
/// On success, returns `200 OK`:
/// ```json
/// { "token": "eyJhbGciOiJIUzI1NiIs..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: `{"error": "InvalidCredentials"}` for an unknown
///   email and for a wrong password alike
/// - `400 Bad Request`: malformed JSON
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AccessToken>, ApiError> {
    let result = match payload {
        Ok(Json(credentials)) => state
            .auth_manager
            .signin(credentials)
            .await
            .map_err(ApiError::from),
        Err(rejection) => Err(rejection.into()),
    };

    match result {
        Ok(token) => {
            metrics::signin_total(SigninOutcome::Success);
            Ok(Json(token))
        }
        Err(err) => {
            let outcome = signin_outcome(&err);
            if outcome == SigninOutcome::InvalidCredentials {
                log_security_event("signin_failed", None, "Invalid credentials");
            }
            metrics::signin_total(outcome);
            Err(err)
        }
    }
}

/// Metric outcome of a failed signup
fn signup_outcome(err: &ApiError) -> SignupOutcome {
    match err {
        ApiError::BadRequest(_) | ApiError::Auth(AuthError::Validation(_)) => {
            SignupOutcome::Invalid
        }
        ApiError::Auth(AuthError::CredentialsTaken) => SignupOutcome::Taken,
        ApiError::Auth(_) => SignupOutcome::Error,
    }
}

/// Metric outcome of a failed signin
fn signin_outcome(err: &ApiError) -> SigninOutcome {
    match err {
        ApiError::BadRequest(_) | ApiError::Auth(AuthError::Validation(_)) => {
            SigninOutcome::Invalid
        }
        ApiError::Auth(AuthError::InvalidCredentials) => SigninOutcome::InvalidCredentials,
        ApiError::Auth(_) => SigninOutcome::Error,
    }
}
