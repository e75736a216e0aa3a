use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{Role, Session};
use crate::credentials::CredentialRecord;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub role: Role,
}

impl From<CredentialRecord> for UserSummary {
    fn from(record: CredentialRecord) -> Self {
        Self {
            username: record.username,
            role: record.role,
        }
    }
}

/// GET /api/admin/users - Every account and its role (never digests)
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<UserSummary>> {
    let users = state.users.list_users().await?;
    Ok(ApiResponse::success(users.into_iter().map(UserSummary::from).collect()))
}

/// POST /api/admin/users - Create an account with any role
///
/// Expected Input:
/// ```json
/// { "username": "bob", "password": "BobPass123!", "role": "analyst" }
/// ```
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<UserSummary> {
    state
        .users
        .register(&payload.username, &payload.password, payload.role)
        .await?;
    tracing::info!(admin = %session.username, username = %payload.username, role = %payload.role, "account created by admin");

    Ok(ApiResponse::created(UserSummary {
        username: payload.username,
        role: payload.role,
    }))
}
