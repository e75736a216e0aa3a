use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{parse_filter, LimitQuery, ListQuery, StatusUpdate};
use crate::auth::Session;
use crate::database::models::{
    NewTicket, Priority, StaffBacklog, Status, StatusBacklog, Ticket, TicketStats,
};
use crate::error::ApiError;
use crate::middleware::{require_writer, ApiResponse, ApiResult};
use crate::server::AppState;

/// GET /api/tickets - List tickets
///
/// Optional filters: `q`, `priority`, `status`, `assigned_to`.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Ticket>> {
    let priority = parse_filter::<Priority>("priority", query.priority.as_deref())?;
    let status = parse_filter::<Status>("status", query.status.as_deref())?;
    let term = query.q.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let assignee = query.assigned_to.as_deref().map(str::trim).filter(|a| !a.is_empty());

    let mut rows = match (term, assignee, priority, status) {
        (Some(term), ..) => state.tickets.search(term).await?,
        (None, Some(staff), ..) => state.tickets.by_assignee(staff).await?,
        (None, None, Some(priority), _) => state.tickets.by_priority(priority).await?,
        (None, None, None, Some(status)) => state.tickets.by_status(status).await?,
        (None, None, None, None) => state.tickets.list().await?,
    };
    if let Some(priority) = priority {
        rows.retain(|r| r.priority == priority);
    }
    if let Some(status) = status {
        rows.retain(|r| r.status == status);
    }
    if let Some(staff) = assignee {
        rows.retain(|r| r.assigned_to.as_deref() == Some(staff));
    }

    Ok(ApiResponse::success(rows))
}

/// POST /api/tickets
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<NewTicket>,
) -> ApiResult<Ticket> {
    require_writer(&session)?;
    if payload.ticket_id.trim().is_empty() {
        return Err(ApiError::bad_request("ticket_id: required"));
    }
    Ok(ApiResponse::created(state.tickets.insert(&payload).await?))
}

/// GET /api/tickets/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Ticket> {
    Ok(ApiResponse::success(state.tickets.get(&id).await?))
}

/// PUT /api/tickets/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> ApiResult<Ticket> {
    require_writer(&session)?;
    let status = parse_filter::<Status>("status", Some(&payload.status))?
        .ok_or_else(|| ApiError::bad_request("status: required"))?;
    Ok(ApiResponse::success(state.tickets.update_status(&id, status).await?))
}

#[derive(Debug, Deserialize)]
pub struct Assignment {
    pub assigned_to: String,
}

/// PUT /api/tickets/:id/assign - Hand a ticket to a staff member
pub async fn assign(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(payload): Json<Assignment>,
) -> ApiResult<Ticket> {
    require_writer(&session)?;
    let staff = payload.assigned_to.trim();
    if staff.is_empty() {
        return Err(ApiError::bad_request("assigned_to: required"));
    }
    Ok(ApiResponse::success(state.tickets.assign(&id, staff).await?))
}

/// DELETE /api/tickets/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    require_writer(&session)?;
    state.tickets.delete(&id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

/// GET /api/tickets/stats - Counts and mean resolution hours by priority and status
pub async fn stats(State(state): State<AppState>) -> ApiResult<Vec<TicketStats>> {
    Ok(ApiResponse::success(state.tickets.stats().await?))
}

#[derive(Debug, Serialize)]
pub struct Backlog {
    pub by_status: Vec<StatusBacklog>,
    pub by_staff: Vec<StaffBacklog>,
    pub oldest_pending: Vec<Ticket>,
}

/// GET /api/tickets/backlog - Where unresolved tickets pile up
///
/// `?limit=` caps `oldest_pending` (default 10).
pub async fn backlog(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Backlog> {
    Ok(ApiResponse::success(Backlog {
        by_status: state.tickets.unresolved_by_status().await?,
        by_staff: state.tickets.unresolved_by_staff().await?,
        oldest_pending: state.tickets.oldest_pending(query.limit()).await?,
    }))
}
