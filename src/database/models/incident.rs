use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Severity, Status};
use crate::database::repository::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Incident {
    pub incident_id: i64,
    pub timestamp: String,
    pub severity: Severity,
    pub category: String,
    pub status: Status,
    pub description: Option<String>,
    pub reported_by: Option<String>,
}

impl Table for Incident {
    type Key = i64;

    const NAME: &'static str = "cyber_incidents";
    const KEY: &'static str = "incident_id";
    const ORDER: &'static str = "timestamp DESC, incident_id DESC";
}

/// Insert payload; also the row shape of `cyber_incidents.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIncident {
    /// Assigned by the database when absent.
    #[serde(default)]
    pub incident_id: Option<i64>,
    /// `YYYY-MM-DD HH:MM:SS`; defaults to now.
    #[serde(default)]
    pub timestamp: Option<String>,
    pub severity: Severity,
    pub category: String,
    #[serde(default = "default_status")]
    pub status: Status,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reported_by: Option<String>,
}

fn default_status() -> Status {
    Status::Open
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IncidentCount {
    pub severity: Severity,
    pub status: Status,
    pub count: i64,
}
