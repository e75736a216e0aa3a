use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{Role, Session, SessionState};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoamiResponse {
    pub username: String,
    pub role: Role,
    pub session: SessionState,
    pub is_analyst: bool,
    pub expires_at: DateTime<Utc>,
}

/// GET /api/auth/whoami - Current session details
///
/// The role comes from the store, not the token, so a role change shows up
/// without logging in again. A session whose account is gone is revoked.
pub async fn whoami(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<WhoamiResponse> {
    let Some(role) = state.users.role_of(&session.username).await? else {
        state.sessions.revoke(&session.id).await;
        tracing::warn!(username = %session.username, "session outlived its account");
        return Err(ApiError::unauthorized("Account no longer exists"));
    };

    Ok(ApiResponse::success(WhoamiResponse {
        username: session.username.clone(),
        role,
        session: SessionState {
            is_logged_in: true,
            username: session.username.clone(),
            is_admin: role == Role::Admin,
        },
        is_analyst: role == Role::Analyst,
        expires_at: session.expires_at,
    }))
}

/// POST /api/auth/logout - Drop the current session
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Value> {
    state.sessions.revoke(&session.id).await;
    Ok(ApiResponse::success(json!({
        "logged_out": true,
        "session": SessionState::anonymous(),
    })))
}
