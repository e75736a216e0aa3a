use anyhow::Context;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Text mode prints a check line; JSON mode merges `fields` next to
/// `"success"` and `"message"`.
pub fn output_success(output_format: &OutputFormat, message: &str, fields: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            println!("✓ {}", message);
            Ok(())
        }
        OutputFormat::Json => {
            let mut body = Map::new();
            body.insert("success".into(), Value::Bool(true));
            body.insert("message".into(), Value::String(message.to_string()));
            if let Some(Value::Object(fields)) = fields {
                body.extend(fields);
            }
            print_json(&body)
        }
    }
}

pub fn output_empty_collection(output_format: &OutputFormat, key: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            println!("{}", message);
            Ok(())
        }
        OutputFormat::Json => print_json(&json!({ key: [] })),
    }
}

/// Prompt for a secret on the terminal unless one was passed in.
pub fn read_password(provided: Option<String>, prompt: &str, confirm: bool) -> anyhow::Result<String> {
    if let Some(password) = provided {
        return Ok(password);
    }

    let mut input = dialoguer::Password::new().with_prompt(prompt);
    if confirm {
        input = input.with_confirmation("Confirm password", "Passwords do not match");
    }
    input.interact().context("Failed to read password")
}
