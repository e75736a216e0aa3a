use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::csv_loader::CsvRow;
use crate::database::models::{Incident, IncidentCount, NewIncident, Severity, Status};
use crate::database::{RecordError, Repository};

const SEARCH_COLUMNS: &[&str] = &["description", "category"];

/// Cyber incidents, keyed by `incident_id`.
#[derive(Clone)]
pub struct IncidentService {
    repo: Repository<Incident>,
}

impl IncidentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repo: Repository::new(pool),
        }
    }

    /// Insert and return the stored row (id and timestamp filled in).
    pub async fn insert(&self, incident: &NewIncident) -> Result<Incident, RecordError> {
        let mut conn = self.repo.pool().acquire().await?;
        let id = insert_incident(&mut conn, incident).await?;
        drop(conn);

        let stored = self.repo.get_404(id).await?;
        info!(incident_id = id, severity = %stored.severity, "incident recorded");
        Ok(stored)
    }

    pub async fn get(&self, incident_id: i64) -> Result<Incident, RecordError> {
        self.repo.get_404(incident_id).await
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Incident>, RecordError> {
        self.repo.list().await
    }

    pub async fn by_severity(&self, severity: Severity) -> Result<Vec<Incident>, RecordError> {
        self.repo.select_eq("severity", severity.as_str()).await
    }

    pub async fn by_status(&self, status: Status) -> Result<Vec<Incident>, RecordError> {
        self.repo.select_eq("status", status.as_str()).await
    }

    pub async fn update_status(&self, incident_id: i64, status: Status) -> Result<Incident, RecordError> {
        self.repo
            .update_column(incident_id, "status", status.as_str())
            .await?;
        info!(incident_id, status = %status, "incident status updated");
        self.repo.get_404(incident_id).await
    }

    pub async fn delete(&self, incident_id: i64) -> Result<(), RecordError> {
        self.repo.delete(incident_id).await?;
        info!(incident_id, "incident deleted");
        Ok(())
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Incident>, RecordError> {
        self.repo.search(SEARCH_COLUMNS, term).await
    }

    /// Counts per severity and status.
    pub async fn stats(&self) -> Result<Vec<IncidentCount>, RecordError> {
        let rows = sqlx::query_as::<_, IncidentCount>(
            "SELECT severity, status, COUNT(*) AS count
             FROM cyber_incidents
             GROUP BY severity, status
             ORDER BY severity, status",
        )
        .fetch_all(self.repo.pool())
        .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, RecordError> {
        self.repo.count().await
    }
}

async fn insert_incident(conn: &mut SqliteConnection, incident: &NewIncident) -> Result<i64, RecordError> {
    let result = sqlx::query(
        "INSERT INTO cyber_incidents
             (incident_id, timestamp, severity, category, status, description, reported_by)
         VALUES (?, COALESCE(?, strftime('%Y-%m-%d %H:%M:%S', 'now')), ?, ?, ?, ?, ?)",
    )
    .bind(incident.incident_id)
    .bind(&incident.timestamp)
    .bind(incident.severity)
    .bind(&incident.category)
    .bind(incident.status)
    .bind(&incident.description)
    .bind(&incident.reported_by)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        let key = incident
            .incident_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "new".to_string());
        RecordError::from_insert(e, "cyber_incidents", key)
    })?;

    Ok(result.last_insert_rowid())
}

#[async_trait]
impl CsvRow for NewIncident {
    type Table = Incident;

    const FILE: &'static str = "cyber_incidents.csv";

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), RecordError> {
        insert_incident(conn, self).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    fn incident(severity: Severity, category: &str, description: &str) -> NewIncident {
        NewIncident {
            incident_id: None,
            timestamp: None,
            severity,
            category: category.to_string(),
            status: Status::Open,
            description: Some(description.to_string()),
            reported_by: Some("analyst1".to_string()),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamp() {
        let ctx = TestContext::new().await.unwrap();
        let service = IncidentService::new(ctx.pool().clone());

        let stored = service
            .insert(&incident(Severity::High, "Phishing", "Fake payroll email"))
            .await
            .unwrap();
        assert!(stored.incident_id > 0);
        assert_eq!(stored.timestamp.len(), 19);
        assert_eq!(stored.status, Status::Open);
        assert_eq!(service.get(stored.incident_id).await.unwrap().category, "Phishing");
    }

    #[tokio::test]
    async fn explicit_id_conflict_is_duplicate() {
        let ctx = TestContext::new().await.unwrap();
        let service = IncidentService::new(ctx.pool().clone());
        let mut first = incident(Severity::Low, "Malware", "Adware popup");
        first.incident_id = Some(42);

        service.insert(&first).await.unwrap();
        let err = service.insert(&first).await.unwrap_err();
        assert!(matches!(err, RecordError::Duplicate { ref key, .. } if key == "42"));
    }

    #[tokio::test]
    async fn filters_and_stats() {
        let ctx = TestContext::new().await.unwrap();
        let service = IncidentService::new(ctx.pool().clone());
        let a = service
            .insert(&incident(Severity::Critical, "Ransomware", "File server encrypted"))
            .await
            .unwrap();
        service
            .insert(&incident(Severity::Critical, "DDoS", "Web tier flooded"))
            .await
            .unwrap();
        service
            .insert(&incident(Severity::Low, "Phishing", "Reported 100% fake link"))
            .await
            .unwrap();

        assert_eq!(service.by_severity(Severity::Critical).await.unwrap().len(), 2);

        service.update_status(a.incident_id, Status::Resolved).await.unwrap();
        assert_eq!(service.by_status(Status::Resolved).await.unwrap().len(), 1);
        assert_eq!(service.by_status(Status::Open).await.unwrap().len(), 2);

        assert_eq!(service.search("encrypted").await.unwrap().len(), 1);
        assert_eq!(service.search("ddos").await.unwrap().len(), 1);
        assert_eq!(service.search("100%").await.unwrap().len(), 1);
        assert_eq!(service.search("0%_").await.unwrap().len(), 0);

        let stats = service.stats().await.unwrap();
        let critical_open = stats
            .iter()
            .find(|s| s.severity == Severity::Critical && s.status == Status::Open)
            .unwrap();
        assert_eq!(critical_open.count, 1);
        assert_eq!(stats.iter().map(|s| s.count).sum::<i64>(), 3);
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let ctx = TestContext::new().await.unwrap();
        let service = IncidentService::new(ctx.pool().clone());

        assert!(matches!(service.get(9).await, Err(RecordError::NotFound { .. })));
        assert!(matches!(
            service.update_status(9, Status::Closed).await,
            Err(RecordError::NotFound { .. })
        ));
        assert!(matches!(service.delete(9).await, Err(RecordError::NotFound { .. })));
    }
}
