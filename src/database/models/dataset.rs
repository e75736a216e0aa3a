use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::repository::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dataset {
    pub dataset_id: String,
    pub name: String,
    pub rows: i64,
    pub columns: i64,
    pub uploaded_by: String,
    pub upload_date: String,
}

impl Table for Dataset {
    type Key = String;

    const NAME: &'static str = "datasets_metadata";
    const KEY: &'static str = "dataset_id";
    const ORDER: &'static str = "upload_date DESC, dataset_id";
}

/// Insert payload; also the row shape of `datasets_metadata.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDataset {
    pub dataset_id: String,
    pub name: String,
    pub rows: i64,
    pub columns: i64,
    pub uploaded_by: String,
    /// `YYYY-MM-DD`
    pub upload_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct DatasetTotals {
    pub datasets: i64,
    pub total_rows: i64,
    pub average_rows: f64,
}
