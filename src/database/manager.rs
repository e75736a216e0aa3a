use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Cannot prepare database directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Owns the SQLite pool. Each operation borrows a connection for the
/// duration of one call and hands it back on every exit path.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
    path: PathBuf,
}

impl DatabaseManager {
    /// Open (creating if missing) the database described by the config.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        Self::open(&config.path, config.max_connections, config.busy_timeout_secs).await
    }

    pub async fn open(
        path: impl AsRef<Path>,
        max_connections: u32,
        busy_timeout_secs: u64,
    ) -> Result<Self, DatabaseError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DatabaseError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        info!("Opened database pool for: {}", path.display());
        Ok(Self { pool, path })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create every table that does not exist yet.
    pub async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        super::schema::initialize_database(&self.pool).await
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool: {}", self.path.display());
    }
}
