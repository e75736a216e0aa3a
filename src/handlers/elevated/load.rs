use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::csv_loader;

/// POST /api/admin/load/:table - Replace a table from its CSV seed
///
/// `:table` is `cyber_incidents`, `it_tickets`, `datasets_metadata`, or
/// `all`. Files are read from the configured data directory. A malformed
/// file answers 400 and leaves the table unchanged.
pub async fn load_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> ApiResult<Value> {
    let pool = state.db.pool();
    let data_dir = &state.settings.data_dir;

    let loaded = if table == "all" {
        csv_loader::load_all(pool, data_dir).await?
    } else {
        csv_loader::load_table(pool, data_dir, &table).await?
    };

    Ok(ApiResponse::success(json!({
        "table": table,
        "rows_loaded": loaded,
    })))
}
