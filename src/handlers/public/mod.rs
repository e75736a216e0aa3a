// handlers/public/mod.rs - handlers reachable without a session
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::server::AppState;

pub mod auth;

/// GET / - Service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Intel Platform API",
            "version": version,
            "description": "Credential store and record API for the intelligence dashboard",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/login, /auth/register (public - session acquisition)",
                "auth": "/api/auth/whoami, /api/auth/logout, /api/auth/password (session)",
                "incidents": "/api/incidents[/:id] (session; writes need analyst or admin)",
                "tickets": "/api/tickets[/:id[/assign]], /api/tickets/backlog (session; writes need analyst or admin)",
                "datasets": "/api/datasets[/:id], /api/datasets/recent (session; writes need analyst or admin)",
                "admin": "/api/admin/users, /api/admin/load/:table, /api/admin/records (admin)",
            }
        }
    }))
}

/// GET /health - Database liveness
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
