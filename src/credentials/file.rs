use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::legacy::{format_line, parse_line, LegacySecret};
use super::{CredentialRecord, CredentialStore};
use crate::auth::{AuthError, ValidationError};

/// Credentials kept in the legacy line format.
///
/// Writers are serialized by an in-process mutex and every change rewrites
/// the whole file through a sibling temp file plus rename, so readers see
/// either the old file or the new one.
pub struct FlatFileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FlatFileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_raw(&self) -> Result<String, AuthError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_records(&self) -> Result<Vec<CredentialRecord>, AuthError> {
        let content = self.read_raw().await?;
        Ok(content
            .lines()
            .enumerate()
            .filter_map(|(i, line)| parse_line(line, i + 1))
            .filter_map(|legacy| match legacy.secret {
                LegacySecret::Digest(digest) => {
                    Some(CredentialRecord::new(legacy.username, digest, legacy.role))
                }
                // A plaintext can never verify; it only becomes usable through migration.
                LegacySecret::Plaintext(_) => None,
            })
            .collect())
    }

    async fn write_atomic(&self, content: &str) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials".into());
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let written = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(content.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FlatFileCredentialStore {
    async fn find(&self, username: &str) -> Result<Option<CredentialRecord>, AuthError> {
        Ok(self
            .read_records()
            .await?
            .into_iter()
            .find(|r| r.username == username))
    }

    async fn insert_if_absent(&self, record: &CredentialRecord) -> Result<bool, AuthError> {
        if record.username.contains([',', '\n', '\r']) {
            return Err(ValidationError::UsernameCharacters.into());
        }

        let _guard = self.write_lock.lock().await;
        let mut content = self.read_raw().await?;
        let taken = content
            .lines()
            .enumerate()
            .filter_map(|(i, line)| parse_line(line, i + 1))
            .any(|existing| existing.username == record.username);
        if taken {
            return Ok(false);
        }

        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&format_line(record));
        content.push('\n');
        self.write_atomic(&content).await?;
        Ok(true)
    }

    async fn replace_digest(
        &self,
        username: &str,
        expected_digest: &str,
        new_digest: &str,
    ) -> Result<bool, AuthError> {
        let _guard = self.write_lock.lock().await;
        let content = self.read_raw().await?;

        let mut swapped = false;
        let mut out = String::with_capacity(content.len());
        for (i, line) in content.lines().enumerate() {
            let matches = !swapped
                && parse_line(line, i + 1).map_or(false, |legacy| {
                    legacy.username == username
                        && legacy.secret == LegacySecret::Digest(expected_digest.to_string())
                });
            if matches {
                let role = parse_line(line, i + 1).map(|l| l.role).unwrap_or_default();
                out.push_str(&format_line(&CredentialRecord::new(username, new_digest, role)));
                swapped = true;
            } else {
                out.push_str(line);
            }
            out.push('\n');
        }

        if swapped {
            self.write_atomic(&out).await?;
        }
        Ok(swapped)
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>, AuthError> {
        self.read_records().await
    }

    async fn count(&self) -> Result<usize, AuthError> {
        Ok(self.read_records().await?.len())
    }

    async fn clear(&self) -> Result<usize, AuthError> {
        let _guard = self.write_lock.lock().await;
        let removed = self.read_records().await?.len();
        self.write_atomic("").await?;
        Ok(removed)
    }
}
