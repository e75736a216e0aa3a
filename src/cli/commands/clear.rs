use serde_json::json;

use crate::cli::context::CliContext;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::services::clear_record_tables;

pub async fn handle(ctx: &CliContext, yes: bool, output_format: OutputFormat) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("Refusing to clear incidents, tickets and datasets without --yes");
    }
    let report = clear_record_tables(ctx.db.pool()).await?;
    output_success(
        &output_format,
        &format!(
            "Cleared {} incident(s), {} ticket(s), {} dataset(s)",
            report.incidents, report.tickets, report.datasets
        ),
        Some(json!({ "cleared": report })),
    )
}
