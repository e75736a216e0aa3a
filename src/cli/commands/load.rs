use serde_json::json;
use std::path::PathBuf;

use crate::cli::context::CliContext;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::services::csv_loader;

pub async fn handle(
    ctx: &CliContext,
    table: Option<String>,
    dir: Option<PathBuf>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| ctx.config.storage.data_dir.clone());
    let pool = ctx.db.pool();

    let (label, loaded) = match table.as_deref() {
        None | Some("all") => ("all tables".to_string(), csv_loader::load_all(pool, &dir).await?),
        Some(name) => (name.to_string(), csv_loader::load_table(pool, &dir, name).await?),
    };

    output_success(
        &output_format,
        &format!("Loaded {} row(s) into {} from {}", loaded, label, dir.display()),
        Some(json!({ "table": label, "dir": dir, "rows_loaded": loaded })),
    )
}
