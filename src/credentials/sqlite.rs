use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{CredentialRecord, CredentialStore};
use crate::auth::AuthError;

/// Credentials in the `users` table. The UNIQUE constraint on `username`
/// arbitrates concurrent registrations.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find(&self, username: &str) -> Result<Option<CredentialRecord>, AuthError> {
        let record = sqlx::query_as::<_, CredentialRecord>(
            "SELECT username, password_digest, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn exists(&self, username: &str) -> Result<bool, AuthError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn insert_if_absent(&self, record: &CredentialRecord) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "INSERT INTO users (username, password_digest, role) VALUES (?, ?, ?)
             ON CONFLICT(username) DO NOTHING",
        )
        .bind(&record.username)
        .bind(&record.password_digest)
        .bind(record.role)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn replace_digest(
        &self,
        username: &str,
        expected_digest: &str,
        new_digest: &str,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE users SET password_digest = ? WHERE username = ? AND password_digest = ?",
        )
        .bind(new_digest)
        .bind(username)
        .bind(expected_digest)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>, AuthError> {
        let records = sqlx::query_as::<_, CredentialRecord>(
            "SELECT username, password_digest, role FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn count(&self) -> Result<usize, AuthError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }

    async fn clear(&self) -> Result<usize, AuthError> {
        let result = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(result.rows_affected() as usize)
    }
}
