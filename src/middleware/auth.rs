use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};

use crate::auth::{validate_jwt, Session};
use crate::error::ApiError;
use crate::server::AppState;

/// Resolves the bearer token to a live registry session and injects it
/// into the request. A token whose session was revoked or has expired is
/// rejected even if its signature is still good.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_session(&state, &headers).await {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Layered after [`session_auth_middleware`] on admin-only routes.
pub async fn require_admin_middleware(
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Response {
    if !session.is_admin() {
        tracing::warn!(username = %session.username, "admin route refused");
        return ApiError::forbidden("Administrator role required").into_response();
    }
    next.run(request).await
}

/// Record writes are limited to analysts and admins.
pub fn require_writer(session: &Session) -> Result<(), ApiError> {
    if session.role.can_write_records() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Analyst or administrator role required"))
    }
}

async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let token = extract_bearer_token(headers).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token, &state.settings.jwt_secret)?;

    let session = state
        .sessions
        .get(&claims.sid)
        .await
        .ok_or_else(|| ApiError::unauthorized("Session expired or logged out"))?;

    if session.username != claims.sub {
        return Err(ApiError::unauthorized("Invalid or expired session token"));
    }
    Ok(session)
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty session token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer  "));
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn writers_are_analysts_and_admins() {
        let ttl = chrono::Duration::hours(1);
        assert!(require_writer(&Session::new("u".into(), Role::User, ttl)).is_err());
        assert!(require_writer(&Session::new("a".into(), Role::Analyst, ttl)).is_ok());
        assert!(require_writer(&Session::new("r".into(), Role::Admin, ttl)).is_ok());
    }
}
