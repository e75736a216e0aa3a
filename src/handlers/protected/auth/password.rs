use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Session;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// PUT /api/auth/password - Change the caller's own password
///
/// Expected Input:
/// ```json
/// { "old_password": "SecurePass123!", "new_password": "NewPass456!" }
/// ```
///
/// Every other session of the user is revoked; the calling one survives.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Value> {
    state
        .users
        .change_password(&session.username, &payload.old_password, &payload.new_password)
        .await?;

    let revoked = state
        .sessions
        .revoke_user_except(&session.username, &session.id)
        .await;

    Ok(ApiResponse::success(json!({
        "username": session.username,
        "password_changed": true,
        "other_sessions_revoked": revoked,
    })))
}
