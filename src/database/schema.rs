use sqlx::SqlitePool;

use super::DatabaseError;

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_digest TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user'
    )
"#;

const CREATE_CYBER_INCIDENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS cyber_incidents (
        incident_id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        severity TEXT NOT NULL DEFAULT 'Low'
            CHECK(severity IN ('Low', 'Medium', 'High', 'Critical')),
        category TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'Open'
            CHECK(status IN ('Open', 'In Progress', 'Resolved', 'Closed')),
        description TEXT,
        reported_by TEXT
    )
"#;

const CREATE_DATASETS_METADATA: &str = r#"
    CREATE TABLE IF NOT EXISTS datasets_metadata (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        dataset_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        rows INTEGER NOT NULL,
        columns INTEGER NOT NULL,
        uploaded_by TEXT NOT NULL,
        upload_date TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

const CREATE_IT_TICKETS: &str = r#"
    CREATE TABLE IF NOT EXISTS it_tickets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ticket_id TEXT NOT NULL UNIQUE,
        priority TEXT NOT NULL
            CHECK(priority IN ('Low', 'Medium', 'High', 'Critical')),
        description TEXT NOT NULL,
        status TEXT NOT NULL
            CHECK(status IN ('Open', 'In Progress', 'Resolved', 'Closed')),
        assigned_to TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        resolution_time_hours INTEGER
    )
"#;

// uploaded_by references users.username only informally; CSV seeds name
// uploaders that never had an account.

pub async fn initialize_database(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;
    for ddl in [
        CREATE_USERS,
        CREATE_CYBER_INCIDENTS,
        CREATE_DATASETS_METADATA,
        CREATE_IT_TICKETS,
    ] {
        sqlx::query(ddl).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}
