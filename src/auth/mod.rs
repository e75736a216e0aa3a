use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod password;
pub mod session;
pub mod validate;

pub use password::PasswordHasher;
pub use session::{Session, SessionRegistry, SessionState};
pub use validate::ValidationError;

/// Coarse authorization label attached to a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Analyst,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Analyst => "analyst",
            Role::Admin => "admin",
        }
    }

    /// Analysts and admins may modify record tables.
    pub fn can_write_records(&self) -> bool {
        matches!(self, Role::Analyst | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Role::User),
            "analyst" => Ok(Role::Analyst),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Failure taxonomy of the credential subsystem.
///
/// `UserNotFound` and `InvalidPassword` stay distinct for callers inside the
/// process; anything facing a client must collapse them into one message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Username '{0}' already exists")]
    AlreadyExists(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Credential storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    /// True for the two failures an attacker must not be able to tell apart.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, AuthError::UserNotFound | AuthError::InvalidPassword)
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::StorageUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::StorageUnavailable(err.to_string())
    }
}

impl From<crate::database::DatabaseError> for AuthError {
    fn from(err: crate::database::DatabaseError) -> Self {
        AuthError::StorageUnavailable(err.to_string())
    }
}

/// Session token claims. The token only points at a registry entry; the
/// registry stays authoritative for logout and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub sid: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_session(session: &Session) -> Self {
        Self {
            sub: session.username.clone(),
            sid: session.id,
            role: session.role,
            exp: session.expires_at.timestamp(),
            iat: session.created_at.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

/// Longest session lifetime honoured, one year.
pub const MAX_SESSION_HOURS: u64 = 24 * 365;

/// Session lifetime as a chrono duration, capped at [`MAX_SESSION_HOURS`].
pub fn session_ttl(hours: u64) -> Duration {
    Duration::hours(hours.min(MAX_SESSION_HOURS) as i64)
}
