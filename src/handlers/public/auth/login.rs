use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, Claims, Role, SessionState};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub session: SessionState,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

/// POST /auth/login - Verify credentials and open a session
///
/// Expected Input:
/// ```json
/// { "username": "alice", "password": "SecurePass123!" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "username": "alice",
///     "role": "analyst",
///     "session": { "is_logged_in": true, "username": "alice", "is_admin": false },
///     "expires_at": "2025-01-01T12:00:00Z",
///     "expires_in": 86400
///   }
/// }
/// ```
///
/// Unknown user and wrong password both answer 401 with the same message.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let role = state
        .users
        .authenticate(&payload.username, &payload.password)
        .await?;

    let session = state
        .sessions
        .create(&payload.username, role, state.settings.session_ttl)
        .await;
    let token = generate_jwt(&Claims::for_session(&session), &state.settings.jwt_secret)?;

    Ok(ApiResponse::success(LoginResponse {
        token,
        username: session.username.clone(),
        role,
        session: session.state(),
        expires_at: session.expires_at,
        expires_in: (session.expires_at - Utc::now()).num_seconds().max(0),
    }))
}
