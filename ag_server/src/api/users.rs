//! Handlers for the authenticated caller's own account.
//!
//! Both routes sit behind `require_auth`.

use authgate::auth::{Principal, UserId};
use axum::Json;
use serde::Serialize;

use super::middleware::{CurrentUser, CurrentUserId};

#[derive(Debug, Serialize)]
pub struct UserIdResponse {
    pub id: UserId,
}

/// `GET /users/me` - the full principal
pub async fn me(CurrentUser(principal): CurrentUser) -> Json<Principal> {
    Json(principal)
}

/// `GET /users/me/id` - just the caller's ID
pub async fn my_id(CurrentUserId(id): CurrentUserId) -> Json<UserIdResponse> {
    Json(UserIdResponse { id })
}
