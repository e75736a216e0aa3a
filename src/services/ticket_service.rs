use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::csv_loader::CsvRow;
use crate::database::models::{NewTicket, Priority, StaffBacklog, Status, StatusBacklog, Ticket, TicketStats};
use crate::database::{RecordError, Repository};

const SEARCH_COLUMNS: &[&str] = &["description", "assigned_to", "ticket_id"];

// Anything not yet Resolved or Closed.
const UNRESOLVED: &str = "status NOT IN ('Resolved', 'Closed')";

#[derive(Clone)]
pub struct TicketService {
    repo: Repository<Ticket>,
}

impl TicketService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repo: Repository::new(pool),
        }
    }

    pub async fn insert(&self, ticket: &NewTicket) -> Result<Ticket, RecordError> {
        let mut conn = self.repo.pool().acquire().await?;
        insert_ticket(&mut conn, ticket).await?;
        drop(conn);

        info!(ticket_id = %ticket.ticket_id, priority = %ticket.priority, "ticket opened");
        self.repo.get_404(ticket.ticket_id.clone()).await
    }

    pub async fn get(&self, ticket_id: &str) -> Result<Ticket, RecordError> {
        self.repo.get_404(ticket_id.to_string()).await
    }

    pub async fn list(&self) -> Result<Vec<Ticket>, RecordError> {
        self.repo.list().await
    }

    pub async fn by_status(&self, status: Status) -> Result<Vec<Ticket>, RecordError> {
        self.repo.select_eq("status", status.as_str()).await
    }

    pub async fn by_priority(&self, priority: Priority) -> Result<Vec<Ticket>, RecordError> {
        self.repo.select_eq("priority", priority.as_str()).await
    }

    pub async fn by_assignee(&self, staff: &str) -> Result<Vec<Ticket>, RecordError> {
        self.repo.select_eq("assigned_to", staff).await
    }

    pub async fn assign(&self, ticket_id: &str, staff: &str) -> Result<Ticket, RecordError> {
        self.repo
            .update_column(ticket_id.to_string(), "assigned_to", staff)
            .await?;
        info!(ticket_id, assigned_to = staff, "ticket assigned");
        self.get(ticket_id).await
    }

    pub async fn update_status(&self, ticket_id: &str, status: Status) -> Result<Ticket, RecordError> {
        self.repo
            .update_column(ticket_id.to_string(), "status", status.as_str())
            .await?;
        info!(ticket_id, status = %status, "ticket status updated");
        self.get(ticket_id).await
    }

    pub async fn delete(&self, ticket_id: &str) -> Result<(), RecordError> {
        self.repo.delete(ticket_id.to_string()).await?;
        info!(ticket_id, "ticket deleted");
        Ok(())
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Ticket>, RecordError> {
        self.repo.search(SEARCH_COLUMNS, term).await
    }

    /// Counts per priority and status, with the mean resolution time of the
    /// tickets that recorded one.
    pub async fn stats(&self) -> Result<Vec<TicketStats>, RecordError> {
        let rows = sqlx::query_as::<_, TicketStats>(
            "SELECT priority, status, COUNT(*) AS count,
                    CAST(AVG(resolution_time_hours) AS REAL) AS avg_resolution_hours
             FROM it_tickets
             GROUP BY priority, status
             ORDER BY priority, status",
        )
        .fetch_all(self.repo.pool())
        .await?;
        Ok(rows)
    }

    /// Statuses holding the most unresolved tickets, busiest first.
    pub async fn unresolved_by_status(&self) -> Result<Vec<StatusBacklog>, RecordError> {
        let sql = format!(
            "SELECT status, COUNT(*) AS count
             FROM it_tickets
             WHERE {}
             GROUP BY status
             ORDER BY count DESC, status",
            UNRESOLVED
        );
        Ok(sqlx::query_as::<_, StatusBacklog>(&sql)
            .fetch_all(self.repo.pool())
            .await?)
    }

    /// Staff holding the most unresolved tickets. Unassigned tickets are
    /// left out.
    pub async fn unresolved_by_staff(&self) -> Result<Vec<StaffBacklog>, RecordError> {
        let sql = format!(
            "SELECT assigned_to, COUNT(*) AS count
             FROM it_tickets
             WHERE {} AND assigned_to IS NOT NULL AND assigned_to <> ''
             GROUP BY assigned_to
             ORDER BY count DESC, assigned_to",
            UNRESOLVED
        );
        Ok(sqlx::query_as::<_, StaffBacklog>(&sql)
            .fetch_all(self.repo.pool())
            .await?)
    }

    /// Unresolved tickets, oldest first.
    pub async fn oldest_pending(&self, limit: i64) -> Result<Vec<Ticket>, RecordError> {
        let sql = format!(
            "SELECT * FROM it_tickets WHERE {} ORDER BY created_at ASC, ticket_id LIMIT ?",
            UNRESOLVED
        );
        Ok(sqlx::query_as::<_, Ticket>(&sql)
            .bind(limit)
            .fetch_all(self.repo.pool())
            .await?)
    }

    pub async fn count(&self) -> Result<i64, RecordError> {
        self.repo.count().await
    }
}

async fn insert_ticket(conn: &mut SqliteConnection, ticket: &NewTicket) -> Result<(), RecordError> {
    sqlx::query(
        "INSERT INTO it_tickets
             (ticket_id, priority, description, status, assigned_to, created_at, resolution_time_hours)
         VALUES (?, ?, ?, ?, ?, COALESCE(?, strftime('%Y-%m-%d %H:%M:%S', 'now')), ?)",
    )
    .bind(&ticket.ticket_id)
    .bind(ticket.priority)
    .bind(&ticket.description)
    .bind(ticket.status)
    .bind(&ticket.assigned_to)
    .bind(&ticket.created_at)
    .bind(ticket.resolution_time_hours)
    .execute(&mut *conn)
    .await
    .map_err(|e| RecordError::from_insert(e, "it_tickets", &ticket.ticket_id))?;
    Ok(())
}

#[async_trait]
impl CsvRow for NewTicket {
    type Table = Ticket;

    const FILE: &'static str = "it_tickets.csv";

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), RecordError> {
        insert_ticket(conn, self).await
    }
}
