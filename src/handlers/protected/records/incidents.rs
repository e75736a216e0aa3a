use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};

use super::{parse_filter, ListQuery, StatusUpdate};
use crate::auth::Session;
use crate::database::models::{Incident, IncidentCount, NewIncident, Severity, Status};
use crate::error::ApiError;
use crate::middleware::{require_writer, ApiResponse, ApiResult};
use crate::server::AppState;

/// GET /api/incidents - List incidents, newest first
///
/// Query parameters (all optional, combinable):
/// - `q`: substring of description or category
/// - `severity`: Low | Medium | High | Critical
/// - `status`: Open | In Progress | Resolved | Closed
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Incident>> {
    let severity = parse_filter::<Severity>("severity", query.severity.as_deref())?;
    let status = parse_filter::<Status>("status", query.status.as_deref())?;
    let term = query.q.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let mut rows = match (term, severity, status) {
        (Some(term), _, _) => state.incidents.search(term).await?,
        (None, Some(severity), _) => state.incidents.by_severity(severity).await?,
        (None, None, Some(status)) => state.incidents.by_status(status).await?,
        (None, None, None) => state.incidents.list().await?,
    };
    if let Some(severity) = severity {
        rows.retain(|r| r.severity == severity);
    }
    if let Some(status) = status {
        rows.retain(|r| r.status == status);
    }

    Ok(ApiResponse::success(rows))
}

/// POST /api/incidents - Record a new incident
///
/// `reported_by` defaults to the caller.
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(mut payload): Json<NewIncident>,
) -> ApiResult<Incident> {
    require_writer(&session)?;
    if payload.reported_by.is_none() {
        payload.reported_by = Some(session.username.clone());
    }
    let incident = state.incidents.insert(&payload).await?;
    Ok(ApiResponse::created(incident))
}

/// GET /api/incidents/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Incident> {
    Ok(ApiResponse::success(state.incidents.get(id).await?))
}

/// PUT /api/incidents/:id/status - `{"status": "Resolved"}`
pub async fn update_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> ApiResult<Incident> {
    require_writer(&session)?;
    let status = parse_filter::<Status>("status", Some(&payload.status))?
        .ok_or_else(|| ApiError::bad_request("status: required"))?;
    Ok(ApiResponse::success(state.incidents.update_status(id, status).await?))
}

/// DELETE /api/incidents/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    require_writer(&session)?;
    state.incidents.delete(id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

/// GET /api/incidents/stats - Counts by severity and status
pub async fn stats(State(state): State<AppState>) -> ApiResult<Vec<IncidentCount>> {
    Ok(ApiResponse::success(state.incidents.stats().await?))
}
