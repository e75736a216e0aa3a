//! The legacy `users.txt` format: one `username,secret[,role]` per line,
//! UTF-8, no quoting. A comma inside a field cannot be represented; lines
//! carrying extra fields are read as their first three and reported.

use std::path::Path;
use tracing::warn;

use super::CredentialRecord;
use crate::auth::password::is_bcrypt_digest;
use crate::auth::{AuthError, Role};

/// Second field of a legacy line. Old exports sometimes carried the
/// password itself instead of a digest.
#[derive(Clone, PartialEq, Eq)]
pub enum LegacySecret {
    Digest(String),
    Plaintext(String),
}

impl LegacySecret {
    pub fn classify(secret: &str) -> Self {
        if is_bcrypt_digest(secret) {
            LegacySecret::Digest(secret.to_string())
        } else {
            LegacySecret::Plaintext(secret.to_string())
        }
    }
}

impl std::fmt::Debug for LegacySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LegacySecret::Digest(_) => f.write_str("Digest(<redacted>)"),
            LegacySecret::Plaintext(_) => f.write_str("Plaintext(<redacted>)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyCredential {
    pub username: String,
    pub secret: LegacySecret,
    pub role: Role,
}

impl LegacyCredential {
    pub fn new(username: impl Into<String>, secret: &str, role: Role) -> Self {
        Self {
            username: username.into(),
            secret: LegacySecret::classify(secret),
            role,
        }
    }
}

/// Parse one line. `None` for blank or unusable lines.
pub fn parse_line(line: &str, line_no: usize) -> Option<LegacyCredential> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 2 {
        warn!(line = line_no, "skipping credential line without a secret field");
        return None;
    }
    if parts.len() > 3 {
        warn!(
            line = line_no,
            fields = parts.len(),
            "credential line has extra fields (embedded comma?); using the first three"
        );
    }

    let username = parts[0];
    let secret = parts[1];
    if username.is_empty() || secret.is_empty() {
        warn!(line = line_no, "skipping credential line with an empty field");
        return None;
    }

    let role = match parts.get(2).filter(|r| !r.is_empty()) {
        None => Role::User,
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => role,
            Err(e) => {
                warn!(line = line_no, username, "skipping credential line: {}", e);
                return None;
            }
        },
    };

    Some(LegacyCredential::new(username, secret, role))
}

/// Parse a whole file body, keeping file order.
pub fn parse_lines(content: &str) -> Vec<LegacyCredential> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| parse_line(line, i + 1))
        .collect()
}

/// Serialize a stored record in the same line format.
pub fn format_line(record: &CredentialRecord) -> String {
    format!("{},{},{}", record.username, record.password_digest, record.role)
}

/// Read a legacy user file. `Ok(None)` when it does not exist.
pub async fn read_legacy_file(path: &Path) -> Result<Option<Vec<LegacyCredential>>, AuthError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(parse_lines(&content))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
