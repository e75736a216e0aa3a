use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::auth::validate::{validate_credentials, validate_password};
use crate::auth::{AuthError, PasswordHasher, Role, ValidationError};
use crate::config::BootstrapConfig;
use crate::credentials::legacy::read_legacy_file;
use crate::credentials::{CredentialRecord, CredentialStore, LegacyCredential, LegacySecret};

/// Registration, authentication and password changes over any
/// [`CredentialStore`].
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    // Verified against when the username is unknown so both failures cost one bcrypt run.
    decoy_digest: Arc<OnceCell<String>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BootstrapReport {
    /// `None` when there was no legacy file to import.
    pub migrated: Option<usize>,
    pub admin_created: bool,
}

impl UserService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            hasher,
            decoy_digest: Arc::new(OnceCell::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub async fn exists(&self, username: &str) -> Result<bool, AuthError> {
        self.store.exists(username).await
    }

    /// Create a credential. Never overwrites: a taken username is
    /// `AlreadyExists`, whether the pre-check or the store catches it.
    pub async fn register(&self, username: &str, password: &str, role: Role) -> Result<(), AuthError> {
        validate_credentials(username, password)?;

        if self.store.exists(username).await? {
            debug!(username, "registration rejected by existence pre-check");
            return Err(AuthError::AlreadyExists(username.to_string()));
        }

        let digest = self.hasher.hash_blocking(password).await?;
        let record = CredentialRecord::new(username, digest, role);
        if !self.store.insert_if_absent(&record).await? {
            return Err(AuthError::AlreadyExists(username.to_string()));
        }

        info!(username, role = %role, "user registered");
        Ok(())
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Role, AuthError> {
        if username.is_empty() {
            return Err(ValidationError::UsernameEmpty.into());
        }
        if password.is_empty() {
            return Err(ValidationError::PasswordEmpty.into());
        }

        let Some(record) = self.store.find(username).await? else {
            let decoy = self.decoy_digest().await?;
            let _ = self.hasher.verify_blocking(&decoy, password).await;
            warn!(username, "login failed");
            return Err(AuthError::UserNotFound);
        };

        if !self.hasher.verify_blocking(&record.password_digest, password).await {
            warn!(username, "login failed");
            return Err(AuthError::InvalidPassword);
        }

        info!(username, role = %record.role, "login succeeded");
        Ok(record.role)
    }

    /// Re-authenticate with the old password, then swap the digest only if
    /// it is still the one that was verified.
    pub async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let record = self.store.find(username).await?.ok_or(AuthError::UserNotFound)?;
        if !self.hasher.verify_blocking(&record.password_digest, old_password).await {
            warn!(username, "password change rejected");
            return Err(AuthError::InvalidPassword);
        }

        let new_digest = self.hasher.hash_blocking(new_password).await?;
        if !self
            .store
            .replace_digest(username, &record.password_digest, &new_digest)
            .await?
        {
            // Someone else changed it between our verify and our write.
            warn!(username, "password changed concurrently; rejecting stale change");
            return Err(AuthError::InvalidPassword);
        }

        info!(username, "password changed");
        Ok(())
    }

    /// Import legacy credentials with insert-if-absent semantics. Returns
    /// how many were newly inserted; a repeat run returns 0.
    pub async fn migrate_from_legacy_source<I>(&self, records: I) -> Result<usize, AuthError>
    where
        I: IntoIterator<Item = LegacyCredential>,
    {
        let mut migrated = 0;
        for legacy in records {
            if self.store.exists(&legacy.username).await? {
                debug!(username = %legacy.username, "already present, skipping");
                continue;
            }

            let digest = match legacy.secret {
                LegacySecret::Digest(digest) => digest,
                LegacySecret::Plaintext(plain) => match self.hasher.hash_blocking(&plain).await {
                    Ok(digest) => digest,
                    Err(AuthError::Validation(e)) => {
                        warn!(username = %legacy.username, "legacy password not importable: {}", e);
                        continue;
                    }
                    Err(e) => return Err(e),
                },
            };

            let record = CredentialRecord::new(legacy.username, digest, legacy.role);
            if self.store.insert_if_absent(&record).await? {
                info!(username = %record.username, role = %record.role, "migrated user");
                migrated += 1;
            }
        }

        info!(count = migrated, "migration complete");
        Ok(migrated)
    }

    /// `Ok(None)` when the file does not exist.
    pub async fn migrate_from_file(&self, path: &Path) -> Result<Option<usize>, AuthError> {
        match read_legacy_file(path).await? {
            Some(records) => self.migrate_from_legacy_source(records).await.map(Some),
            None => {
                warn!("legacy user file not found: {}", path.display());
                Ok(None)
            }
        }
    }

    pub async fn role_of(&self, username: &str) -> Result<Option<Role>, AuthError> {
        Ok(self.store.find(username).await?.map(|r| r.role))
    }

    pub async fn is_admin(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.role_of(username).await? == Some(Role::Admin))
    }

    pub async fn is_analyst(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.role_of(username).await? == Some(Role::Analyst))
    }

    pub async fn list_users(&self) -> Result<Vec<CredentialRecord>, AuthError> {
        self.store.list().await
    }

    pub async fn user_count(&self) -> Result<usize, AuthError> {
        self.store.count().await
    }

    pub async fn clear_users(&self) -> Result<usize, AuthError> {
        let removed = self.store.clear().await?;
        warn!(count = removed, "credential store cleared");
        Ok(removed)
    }

    /// Create the admin account when the store is empty.
    pub async fn ensure_default_admin(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        if self.store.count().await? > 0 {
            return Ok(false);
        }
        match self.register(username, password, Role::Admin).await {
            Ok(()) => Ok(true),
            // Lost a race with another bootstrapper.
            Err(AuthError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Import the legacy file once, then seed an admin if nobody exists.
    pub async fn bootstrap(
        &self,
        legacy_file: &Path,
        admin: &BootstrapConfig,
    ) -> Result<BootstrapReport, AuthError> {
        let migrated = self.migrate_from_file(legacy_file).await?;

        let admin_created = match admin.admin_password.as_deref() {
            Some(password) => self.ensure_default_admin(&admin.admin_username, password).await?,
            None => {
                if self.store.count().await? == 0 {
                    warn!("credential store is empty and no bootstrap admin password is configured");
                }
                false
            }
        };

        Ok(BootstrapReport {
            migrated,
            admin_created,
        })
    }

    async fn decoy_digest(&self) -> Result<String, AuthError> {
        let hasher = self.hasher;
        self.decoy_digest
            .get_or_try_init(|| async move { hasher.hash_blocking("decoy-password").await })
            .await
            .cloned()
    }
}
