use serde_json::json;

use crate::cli::context::CliContext;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

/// Schema is already created by `CliContext::open`; this runs the
/// credential bootstrap on top of it.
pub async fn handle(ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let report = ctx
        .users
        .bootstrap(&ctx.config.storage.legacy_user_file, &ctx.config.bootstrap)
        .await?;
    let users = ctx.users.user_count().await?;

    let message = match report.migrated {
        Some(n) => format!(
            "Database ready at {} ({} user(s) migrated from {}, {} total)",
            ctx.db.path().display(),
            n,
            ctx.config.storage.legacy_user_file.display(),
            users
        ),
        None => format!("Database ready at {} ({} user(s))", ctx.db.path().display(), users),
    };
    output_success(
        &output_format,
        &message,
        Some(json!({
            "database": ctx.db.path(),
            "migrated": report.migrated,
            "admin_created": report.admin_created,
            "users": users,
        })),
    )?;

    if report.admin_created {
        if let OutputFormat::Text = output_format {
            println!("  default admin '{}' created", ctx.config.bootstrap.admin_username);
        }
    }
    Ok(())
}
