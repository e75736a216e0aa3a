//! Persistent username -> digest -> role mapping.
//!
//! Two interchangeable backends implement [`CredentialStore`]: the SQLite
//! `users` table (canonical) and the legacy comma-delimited text file.
//! Every write is insert-if-absent or compare-and-swap, so the backend, not
//! a prior existence check, decides conflicts.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::auth::AuthError;
use crate::config::CredentialBackend;
use crate::database::DatabaseManager;

pub mod file;
pub mod legacy;
pub mod sqlite;

pub use crate::database::models::CredentialRecord;
pub use file::FlatFileCredentialStore;
pub use legacy::{LegacyCredential, LegacySecret};
pub use sqlite::SqliteCredentialStore;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Case-sensitive exact lookup.
    async fn find(&self, username: &str) -> Result<Option<CredentialRecord>, AuthError>;

    async fn exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.find(username).await?.is_some())
    }

    /// Insert unless the username is taken. Returns whether a row was written;
    /// an existing record is never touched.
    async fn insert_if_absent(&self, record: &CredentialRecord) -> Result<bool, AuthError>;

    /// Swap the digest only while it still equals `expected_digest`.
    /// Returns whether the swap happened.
    async fn replace_digest(
        &self,
        username: &str,
        expected_digest: &str,
        new_digest: &str,
    ) -> Result<bool, AuthError>;

    async fn list(&self) -> Result<Vec<CredentialRecord>, AuthError>;

    async fn count(&self) -> Result<usize, AuthError>;

    /// Administrative bulk clear. Returns how many records were removed.
    async fn clear(&self) -> Result<usize, AuthError>;
}

/// Build the configured backend.
pub fn open_credential_store(
    backend: CredentialBackend,
    database: &DatabaseManager,
    credential_file: &Path,
) -> Arc<dyn CredentialStore> {
    match backend {
        CredentialBackend::Sqlite => Arc::new(SqliteCredentialStore::new(database.pool().clone())),
        CredentialBackend::File => Arc::new(FlatFileCredentialStore::new(credential_file)),
    }
}
