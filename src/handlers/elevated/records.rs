use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::{clear_record_tables, ClearReport};

#[derive(Debug, Default, Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// DELETE /api/admin/records?confirm=true - Empty every record table
///
/// Incidents, tickets and datasets are wiped and their ids restart at 1.
/// Accounts are left alone.
pub async fn clear(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> ApiResult<ClearReport> {
    if !query.confirm {
        return Err(ApiError::bad_request("confirm=true is required to clear records"));
    }
    Ok(ApiResponse::success(clear_record_tables(state.db.pool()).await?))
}
