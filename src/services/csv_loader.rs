use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::{SqliteConnection, SqlitePool};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::database::models::{NewDataset, NewIncident, NewTicket};
use crate::database::{RecordError, Repository, Table};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}, line {line}: {source}")]
    Parse {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A CSV row that knows how to write itself into its table.
#[async_trait]
pub trait CsvRow: DeserializeOwned + Send + Sync {
    type Table: Table;

    /// File name under the data directory.
    const FILE: &'static str;

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), RecordError>;
}

/// Files `load_all` looks for, in load order.
pub const CSV_FILES: &[&str] = &[
    <NewIncident as CsvRow>::FILE,
    <NewTicket as CsvRow>::FILE,
    <NewDataset as CsvRow>::FILE,
];

pub async fn read_csv<R: CsvRow>(path: &Path) -> Result<Vec<R>, LoadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let mut rows = Vec::new();
    for result in reader.deserialize::<R>() {
        let row = result.map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            line: source.position().map(|p| p.line()).unwrap_or(0),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Replace the whole table with the rows of `path`. The file is parsed in
/// full before anything is touched, and the delete plus inserts share one
/// transaction, so a bad file leaves the old rows in place.
pub async fn replace_table_from_csv<R: CsvRow>(pool: &SqlitePool, path: &Path) -> Result<usize, LoadError> {
    let rows = read_csv::<R>(path).await?;

    let mut tx = pool.begin().await?;
    let removed = Repository::<R::Table>::clear(&mut *tx).await?;
    for row in &rows {
        row.insert(&mut *tx).await?;
    }
    tx.commit().await?;

    info!(
        table = <R::Table as Table>::NAME,
        removed,
        loaded = rows.len(),
        "reloaded table from {}",
        path.display()
    );
    Ok(rows.len())
}

/// Reload one table by name from `<data_dir>/<table>.csv`.
pub async fn load_table(pool: &SqlitePool, data_dir: &Path, table: &str) -> Result<usize, LoadError> {
    let table = table.trim_end_matches(".csv");
    match table {
        "cyber_incidents" => replace_table_from_csv::<NewIncident>(pool, &data_dir.join(NewIncident::FILE)).await,
        "it_tickets" => replace_table_from_csv::<NewTicket>(pool, &data_dir.join(NewTicket::FILE)).await,
        "datasets_metadata" => replace_table_from_csv::<NewDataset>(pool, &data_dir.join(NewDataset::FILE)).await,
        other => Err(LoadError::UnknownTable(other.to_string())),
    }
}

/// Load every known CSV present in `data_dir`; missing files are skipped.
/// Returns the total number of rows loaded.
pub async fn load_all(pool: &SqlitePool, data_dir: &Path) -> Result<usize, LoadError> {
    let mut total = 0;
    for file in CSV_FILES {
        let path = data_dir.join(file);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!("CSV file not found, skipping: {}", path.display());
            continue;
        }
        total += load_table(pool, data_dir, file).await?;
    }
    info!(total, "CSV load complete");
    Ok(total)
}
