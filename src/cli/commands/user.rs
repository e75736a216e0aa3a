use clap::Subcommand;
use serde_json::json;

use crate::auth::Role;
use crate::cli::context::CliContext;
use crate::cli::utils::{output_empty_collection, output_success, print_json, read_password};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create an account")]
    Register {
        #[arg(help = "Username (3-20 alphanumeric characters)")]
        username: String,

        #[arg(long, default_value = "user", help = "user, analyst or admin")]
        role: Role,

        #[arg(long, help = "Password (prompted when omitted)")]
        password: Option<String>,
    },

    #[command(about = "Change an account's password")]
    Passwd {
        #[arg(help = "Username")]
        username: String,
    },

    #[command(about = "List accounts and roles")]
    List,

    #[command(about = "Show an account's role")]
    Role {
        #[arg(help = "Username")]
        username: String,
    },

    #[command(about = "Delete every account")]
    Clear {
        #[arg(long, help = "Required; there is no undo")]
        yes: bool,
    },
}

pub async fn handle(ctx: &CliContext, cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Register {
            username,
            role,
            password,
        } => {
            let password = read_password(password, "Password", true)?;
            ctx.users.register(&username, &password, role).await?;
            output_success(
                &output_format,
                &format!("User '{}' registered as {}", username, role),
                Some(json!({ "username": username, "role": role })),
            )
        }
        UserCommands::Passwd { username } => {
            let old = read_password(None, "Current password", false)?;
            let new = read_password(None, "New password", true)?;
            ctx.users.change_password(&username, &old, &new).await?;
            output_success(
                &output_format,
                &format!("Password changed for '{}'", username),
                Some(json!({ "username": username })),
            )
        }
        UserCommands::List => {
            let users = ctx.users.list_users().await?;
            if users.is_empty() {
                return output_empty_collection(&output_format, "users", "No users registered");
            }

            match output_format {
                OutputFormat::Json => print_json(&json!({ "users": users }))?,
                OutputFormat::Text => {
                    println!("{:<22} {}", "USERNAME", "ROLE");
                    println!("{}", "-".repeat(32));
                    for user in &users {
                        println!("{:<22} {}", user.username, user.role);
                    }
                }
            }
            Ok(())
        }
        UserCommands::Role { username } => {
            let role = ctx
                .users
                .role_of(&username)
                .await?
                .ok_or_else(|| anyhow::anyhow!("User '{}' not found", username))?;
            output_success(
                &output_format,
                &format!("{} is {}", username, role),
                Some(json!({ "username": username, "role": role })),
            )
        }
        UserCommands::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to delete all accounts without --yes");
            }
            let removed = ctx.users.clear_users().await?;
            output_success(
                &output_format,
                &format!("Removed {} account(s)", removed),
                Some(json!({ "removed": removed })),
            )
        }
    }
}
