use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::csv_loader::CsvRow;
use crate::database::models::{Dataset, DatasetTotals, NewDataset};
use crate::database::{RecordError, Repository, Table};

const SEARCH_COLUMNS: &[&str] = &["name", "uploaded_by"];

#[derive(Clone)]
pub struct DatasetService {
    repo: Repository<Dataset>,
}

impl DatasetService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repo: Repository::new(pool),
        }
    }

    pub async fn insert(&self, dataset: &NewDataset) -> Result<Dataset, RecordError> {
        let mut conn = self.repo.pool().acquire().await?;
        insert_dataset(&mut conn, dataset).await?;
        drop(conn);

        info!(dataset_id = %dataset.dataset_id, rows = dataset.rows, "dataset registered");
        self.repo.get_404(dataset.dataset_id.clone()).await
    }

    pub async fn get(&self, dataset_id: &str) -> Result<Dataset, RecordError> {
        self.repo.get_404(dataset_id.to_string()).await
    }

    pub async fn list(&self) -> Result<Vec<Dataset>, RecordError> {
        self.repo.list().await
    }

    pub async fn by_uploader(&self, uploaded_by: &str) -> Result<Vec<Dataset>, RecordError> {
        self.repo.select_eq("uploaded_by", uploaded_by).await
    }

    /// Datasets with more than `rows` rows, largest first.
    pub async fn larger_than(&self, rows: i64) -> Result<Vec<Dataset>, RecordError> {
        let sql = format!(
            "SELECT * FROM {} WHERE \"rows\" > ? ORDER BY \"rows\" DESC",
            Dataset::NAME
        );
        Ok(sqlx::query_as::<_, Dataset>(&sql)
            .bind(rows)
            .fetch_all(self.repo.pool())
            .await?)
    }

    /// Uploaded strictly before `cutoff`.
    pub async fn uploaded_before(&self, cutoff: NaiveDate) -> Result<Vec<Dataset>, RecordError> {
        let sql = format!(
            "SELECT * FROM {} WHERE upload_date < ? ORDER BY {}",
            Dataset::NAME,
            Dataset::ORDER
        );
        Ok(sqlx::query_as::<_, Dataset>(&sql)
            .bind(cutoff.format("%Y-%m-%d").to_string())
            .fetch_all(self.repo.pool())
            .await?)
    }

    /// Latest uploads first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Dataset>, RecordError> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY upload_date DESC, id DESC LIMIT ?",
            Dataset::NAME
        );
        Ok(sqlx::query_as::<_, Dataset>(&sql)
            .bind(limit)
            .fetch_all(self.repo.pool())
            .await?)
    }

    pub async fn delete(&self, dataset_id: &str) -> Result<(), RecordError> {
        self.repo.delete(dataset_id.to_string()).await?;
        info!(dataset_id, "dataset deleted");
        Ok(())
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Dataset>, RecordError> {
        self.repo.search(SEARCH_COLUMNS, term).await
    }

    pub async fn totals(&self) -> Result<DatasetTotals, RecordError> {
        let totals = sqlx::query_as::<_, DatasetTotals>(
            "SELECT COUNT(*) AS datasets,
                    COALESCE(SUM(\"rows\"), 0) AS total_rows,
                    CAST(COALESCE(AVG(\"rows\"), 0) AS REAL) AS average_rows
             FROM datasets_metadata",
        )
        .fetch_one(self.repo.pool())
        .await?;
        Ok(totals)
    }
}

async fn insert_dataset(conn: &mut SqliteConnection, dataset: &NewDataset) -> Result<(), RecordError> {
    sqlx::query(
        "INSERT INTO datasets_metadata (dataset_id, name, \"rows\", \"columns\", uploaded_by, upload_date)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&dataset.dataset_id)
    .bind(&dataset.name)
    .bind(dataset.rows)
    .bind(dataset.columns)
    .bind(&dataset.uploaded_by)
    .bind(&dataset.upload_date)
    .execute(&mut *conn)
    .await
    .map_err(|e| RecordError::from_insert(e, Dataset::NAME, &dataset.dataset_id))?;
    Ok(())
}

#[async_trait]
impl CsvRow for NewDataset {
    type Table = Dataset;

    const FILE: &'static str = "datasets_metadata.csv";

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), RecordError> {
        insert_dataset(conn, self).await
    }
}
