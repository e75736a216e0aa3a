use serde_json::json;
use std::path::PathBuf;

use crate::cli::context::CliContext;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

pub async fn handle(
    ctx: &CliContext,
    file: Option<PathBuf>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(|| ctx.config.storage.legacy_user_file.clone());

    let migrated = ctx
        .users
        .migrate_from_file(&path)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Legacy user file not found: {}", path.display()))?;

    output_success(
        &output_format,
        &format!("Migrated {} user(s) from {}", migrated, path.display()),
        Some(json!({ "file": path, "migrated": migrated })),
    )
}
