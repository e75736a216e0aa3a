use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::database::models::{Dataset, Incident, Ticket};
use crate::database::{RecordError, Repository, Table};

/// Rows removed per table by [`clear_record_tables`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub incidents: u64,
    pub tickets: u64,
    pub datasets: u64,
}

impl ClearReport {
    pub fn total(&self) -> u64 {
        self.incidents + self.tickets + self.datasets
    }
}

/// Empty the incident, ticket and dataset tables in one transaction and
/// restart their row ids. Accounts in `users` are untouched.
pub async fn clear_record_tables(pool: &SqlitePool) -> Result<ClearReport, RecordError> {
    let mut tx = pool.begin().await?;

    let report = ClearReport {
        incidents: Repository::<Incident>::clear(&mut *tx).await?,
        tickets: Repository::<Ticket>::clear(&mut *tx).await?,
        datasets: Repository::<Dataset>::clear(&mut *tx).await?,
    };

    sqlx::query("DELETE FROM sqlite_sequence WHERE name IN (?, ?, ?)")
        .bind(Incident::NAME)
        .bind(Ticket::NAME)
        .bind(Dataset::NAME)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    warn!(
        incidents = report.incidents,
        tickets = report.tickets,
        datasets = report.datasets,
        "record tables cleared"
    );
    Ok(report)
}
