use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};

use super::{LimitQuery, ListQuery};
use crate::auth::Session;
use crate::database::models::{Dataset, DatasetTotals, NewDataset};
use crate::error::ApiError;
use crate::middleware::{require_writer, ApiResponse, ApiResult};
use crate::server::AppState;

/// GET /api/datasets - List dataset metadata
///
/// Optional filters: `q` (name or uploader), `uploaded_by`, `min_rows`
/// (strictly more rows than), `before` (`YYYY-MM-DD`, strictly earlier).
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Dataset>> {
    let before = match query.before.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ApiError::bad_request("before: expected YYYY-MM-DD"))?,
        ),
        None => None,
    };
    let uploader = query.uploaded_by.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let term = query.q.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let mut rows = match (term, query.min_rows, before, uploader) {
        (Some(term), ..) => state.datasets.search(term).await?,
        (None, Some(min_rows), ..) => state.datasets.larger_than(min_rows).await?,
        (None, None, Some(cutoff), _) => state.datasets.uploaded_before(cutoff).await?,
        (None, None, None, Some(uploader)) => state.datasets.by_uploader(uploader).await?,
        (None, None, None, None) => state.datasets.list().await?,
    };
    if let Some(min_rows) = query.min_rows {
        rows.retain(|d| d.rows > min_rows);
    }
    if let Some(cutoff) = before {
        let cutoff = cutoff.format("%Y-%m-%d").to_string();
        rows.retain(|d| d.upload_date < cutoff);
    }
    if let Some(uploader) = uploader {
        rows.retain(|d| d.uploaded_by == uploader);
    }

    Ok(ApiResponse::success(rows))
}

/// POST /api/datasets
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<NewDataset>,
) -> ApiResult<Dataset> {
    require_writer(&session)?;
    if payload.rows < 0 || payload.columns < 0 {
        return Err(ApiError::bad_request("rows and columns must not be negative"));
    }
    if NaiveDate::parse_from_str(&payload.upload_date, "%Y-%m-%d").is_err() {
        return Err(ApiError::bad_request("upload_date: expected YYYY-MM-DD"));
    }
    Ok(ApiResponse::created(state.datasets.insert(&payload).await?))
}

/// GET /api/datasets/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Dataset> {
    Ok(ApiResponse::success(state.datasets.get(&id).await?))
}

/// DELETE /api/datasets/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    require_writer(&session)?;
    state.datasets.delete(&id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

/// GET /api/datasets/stats - Count, total rows and average rows
pub async fn stats(State(state): State<AppState>) -> ApiResult<DatasetTotals> {
    Ok(ApiResponse::success(state.datasets.totals().await?))
}

/// GET /api/datasets/recent - Latest uploads (`?limit=`, default 10)
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<Dataset>> {
    Ok(ApiResponse::success(state.datasets.recent(query.limit()).await?))
}
