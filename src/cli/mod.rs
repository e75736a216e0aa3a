pub mod commands;
pub mod context;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intel")]
#[command(about = "Intel platform operator CLI - credentials, migration and CSV seeding")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "SQLite database path (overrides DATABASE_PATH)")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the schema, import the legacy user file and seed the admin")]
    Init,

    #[command(about = "Import a legacy users.txt into the credential store")]
    Migrate {
        #[arg(long, help = "Legacy file (defaults to STORAGE_LEGACY_USER_FILE)")]
        file: Option<PathBuf>,
    },

    #[command(about = "Account management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Replace record tables from their CSV files")]
    LoadCsv {
        #[arg(long, help = "cyber_incidents, it_tickets or datasets_metadata (default: all)")]
        table: Option<String>,

        #[arg(long, help = "Directory holding the CSV files (defaults to STORAGE_DATA_DIR)")]
        dir: Option<PathBuf>,
    },

    #[command(about = "Empty the incident, ticket and dataset tables (accounts are kept)")]
    ClearRecords {
        #[arg(long, help = "Required; there is no undo")]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let ctx = context::CliContext::open(cli.database.as_deref()).await?;

    let result = match cli.command {
        Commands::Init => commands::init::handle(&ctx, output_format).await,
        Commands::Migrate { file } => commands::migrate::handle(&ctx, file, output_format).await,
        Commands::User { cmd } => commands::user::handle(&ctx, cmd, output_format).await,
        Commands::LoadCsv { table, dir } => commands::load::handle(&ctx, table, dir, output_format).await,
        Commands::ClearRecords { yes } => commands::clear::handle(&ctx, yes, output_format).await,
    };

    ctx.db.close().await;
    result
}
