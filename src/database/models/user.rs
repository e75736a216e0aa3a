use serde::Serialize;
use sqlx::FromRow;

use crate::auth::Role;

/// One row of the credential store.
///
/// The digest is never serialized and `Debug` redacts it, so a record can
/// be logged or returned from an API without leaking it.
#[derive(Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CredentialRecord {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub role: Role,
}

impl CredentialRecord {
    pub fn new(username: impl Into<String>, password_digest: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password_digest: password_digest.into(),
            role,
        }
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("password_digest", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_never_leaks() {
        let record = CredentialRecord::new("alice", "$2b$04$secretdigest", Role::Analyst);
        let debug = format!("{:?}", record);
        assert!(!debug.contains("secretdigest"));
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("secretdigest"));
        assert!(json.contains("\"role\":\"analyst\""));
    }
}
