use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Role;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// POST /auth/register - Self-service account creation
///
/// Always creates a `user`; elevated roles are granted through
/// `/api/admin/users`. Answers 403 when self registration is disabled,
/// 400 on policy failures and 409 when the username is taken.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Value> {
    if !state.settings.allow_self_registration {
        return Err(ApiError::forbidden("Self registration is disabled"));
    }

    state
        .users
        .register(&payload.username, &payload.password, Role::User)
        .await?;

    Ok(ApiResponse::created(json!({
        "username": payload.username,
        "role": Role::User,
    })))
}
