//! HTTP error responses.
//!
//! Every failure leaves the server as `{"error": "<Kind>"}` with an optional
//! `message`. Only validation errors carry a message; internal errors are
//! logged and collapsed to `InternalError`.

use authgate::auth::AuthError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error returned by handlers and the auth middleware
#[derive(Debug)]
pub enum ApiError {
    /// Failure from the authentication core
    Auth(AuthError),
    /// Request body could not be parsed
    BadRequest(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// Status code and stable error kind for this error
    pub fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::Auth(err) => match err {
                AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
                AuthError::CredentialsTaken => (StatusCode::CONFLICT, "CredentialsTaken"),
                AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "InvalidCredentials"),
                // Token failures are merged for the caller
                AuthError::Unauthenticated | AuthError::Token(_) => {
                    (StatusCode::UNAUTHORIZED, "Unauthenticated")
                }
                AuthError::HashingFailed | AuthError::Store(_) | AuthError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "InternalError")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = match self {
            ApiError::BadRequest(message) => Some(message),
            ApiError::Auth(AuthError::Validation(message)) => Some(message),
            ApiError::Auth(err) if err.is_internal() => {
                tracing::error!(error = %err, "Request failed with internal error");
                None
            }
            ApiError::Auth(_) => None,
        };

        (status, Json(ErrorResponse { error: kind, message })).into_response()
    }
}
