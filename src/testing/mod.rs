use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::auth::PasswordHasher;
use crate::credentials::SqliteCredentialStore;
use crate::database::DatabaseManager;
use crate::services::UserService;

/// Lowest bcrypt cost so tests don't spend their time hashing.
pub const TEST_BCRYPT_COST: u32 = 4;

/// A throwaway database under a temp directory with the schema in place.
/// Everything is removed when the context drops.
pub struct TestContext {
    dir: TempDir,
    db: DatabaseManager,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let db = DatabaseManager::open(dir.path().join("test.db"), 4, 5)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open test database: {}", e))?;
        db.initialize_schema()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create test schema: {}", e))?;
        Ok(Self { dir, db })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn db(&self) -> &DatabaseManager {
        &self.db
    }

    pub fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    /// A user service over the SQLite backend.
    pub fn users(&self) -> UserService {
        UserService::new(
            Arc::new(SqliteCredentialStore::new(self.pool().clone())),
            PasswordHasher::new(TEST_BCRYPT_COST),
        )
    }
}
