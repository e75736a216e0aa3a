use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Priority, Status};
use crate::database::repository::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub ticket_id: String,
    pub priority: Priority,
    pub description: String,
    pub status: Status,
    pub assigned_to: Option<String>,
    pub created_at: String,
    pub resolution_time_hours: Option<i64>,
}

impl Table for Ticket {
    type Key = String;

    const NAME: &'static str = "it_tickets";
    const KEY: &'static str = "ticket_id";
    const ORDER: &'static str = "created_at DESC, ticket_id";
}

/// Insert payload; also the row shape of `it_tickets.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub ticket_id: String,
    pub priority: Priority,
    pub description: String,
    pub status: Status,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub resolution_time_hours: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketStats {
    pub priority: Priority,
    pub status: Status,
    pub count: i64,
    pub avg_resolution_hours: Option<f64>,
}

/// Unresolved tickets sitting in one status.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusBacklog {
    pub status: Status,
    pub count: i64,
}

/// Unresolved tickets assigned to one person.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StaffBacklog {
    pub assigned_to: String,
    pub count: i64,
}
