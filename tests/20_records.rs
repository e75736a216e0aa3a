mod common;

use anyhow::Result;
use common::{TestServer, ADMIN, ANALYST, VIEWER};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn incident_lifecycle() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(ANALYST.0, ANALYST.1).await?;

    let res = server
        .client
        .post(server.url("/api/incidents"))
        .bearer_auth(&token)
        .json(&json!({
            "severity": "Critical",
            "category": "Ransomware",
            "description": "File server encrypted"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let id = created["data"]["incident_id"].as_i64().expect("incident id");
    assert_eq!(created["data"]["status"], "Open");
    assert_eq!(created["data"]["reported_by"], ANALYST.0);

    server
        .client
        .post(server.url("/api/incidents"))
        .bearer_auth(&token)
        .json(&json!({ "severity": "Low", "category": "Phishing" }))
        .send()
        .await?
        .error_for_status()?;

    let critical: Value = server
        .client
        .get(server.url("/api/incidents?severity=critical"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(critical["data"].as_array().map(Vec::len), Some(1));

    let res = server
        .client
        .put(server.url(&format!("/api/incidents/{}/status", id)))
        .bearer_auth(&token)
        .json(&json!({ "status": "In Progress" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["data"]["status"], "In Progress");

    let res = server
        .client
        .put(server.url(&format!("/api/incidents/{}/status", id)))
        .bearer_auth(&token)
        .json(&json!({ "status": "Investigating" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let investigating: Value = server
        .client
        .get(server.url("/api/incidents?status=Investigating"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(investigating["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(investigating["data"][0]["status"], "In Progress");

    let stats: Value = server
        .client
        .get(server.url("/api/incidents/stats"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let total: i64 = stats["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["count"].as_i64()).sum())
        .unwrap_or(0);
    assert_eq!(total, 2);

    let res = server
        .client
        .delete(server.url(&format!("/api/incidents/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .get(server.url(&format!("/api/incidents/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn plain_users_read_but_do_not_write() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(VIEWER.0, VIEWER.1).await?;

    let res = server
        .client
        .get(server.url("/api/tickets"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .post(server.url("/api/tickets"))
        .bearer_auth(&token)
        .json(&json!({
            "ticket_id": "T-1",
            "priority": "High",
            "description": "VPN down",
            "status": "Open"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn ticket_duplicates_conflict() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(ANALYST.0, ANALYST.1).await?;
    let ticket = json!({
        "ticket_id": "T-9",
        "priority": "Medium",
        "description": "Printer offline",
        "status": "Open",
        "assigned_to": "IT_Support_B"
    });

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let res = server
            .client
            .post(server.url("/api/tickets"))
            .bearer_auth(&token)
            .json(&ticket)
            .send()
            .await?;
        assert_eq!(res.status(), expected);
    }

    let res = server
        .client
        .get(server.url("/api/tickets?priority=urgent"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn dataset_filters_and_totals() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(ANALYST.0, ANALYST.1).await?;

    for (id, rows, date) in [("D-1", 5000, "2024-09-01"), ("D-2", 200, "2024-11-01")] {
        server
            .client
            .post(server.url("/api/datasets"))
            .bearer_auth(&token)
            .json(&json!({
                "dataset_id": id,
                "name": format!("dataset {}", id),
                "rows": rows,
                "columns": 5,
                "uploaded_by": ANALYST.0,
                "upload_date": date
            }))
            .send()
            .await?
            .error_for_status()?;
    }

    let big: Value = server
        .client
        .get(server.url("/api/datasets?min_rows=1000"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(big["data"][0]["dataset_id"], "D-1");
    assert_eq!(big["data"].as_array().map(Vec::len), Some(1));

    let older: Value = server
        .client
        .get(server.url("/api/datasets?before=2024-10-01"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(older["data"].as_array().map(Vec::len), Some(1));

    let totals: Value = server
        .client
        .get(server.url("/api/datasets/stats"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(totals["data"]["datasets"], 2);
    assert_eq!(totals["data"]["total_rows"], 5200);
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_admin() -> Result<()> {
    let server = TestServer::start().await?;
    let analyst = server.login(ANALYST.0, ANALYST.1).await?;
    let admin = server.login(ADMIN.0, ADMIN.1).await?;

    let res = server
        .client
        .get(server.url("/api/admin/users"))
        .bearer_auth(&analyst)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .post(server.url("/api/admin/users"))
        .bearer_auth(&admin)
        .json(&json!({ "username": "newanalyst", "password": "NewAnalyst1!", "role": "analyst" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let listed: Value = server
        .client
        .get(server.url("/api/admin/users"))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    let users = listed["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(users.len(), 4);
    assert!(users.iter().all(|u| u.get("password_digest").is_none()));
    assert!(users
        .iter()
        .any(|u| u["username"] == "newanalyst" && u["role"] == "analyst"));
    Ok(())
}

#[tokio::test]
async fn admin_reloads_tables_from_csv() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.login(ADMIN.0, ADMIN.1).await?;

    server
        .write_data_file(
            "it_tickets.csv",
            "ticket_id,priority,description,status,assigned_to,created_at,resolution_time_hours\n\
             T-1,High,VPN down,Resolved,IT_Support_A,2024-11-01 08:00:00,4\n\
             T-2,Low,Mouse broken,Open,,2024-11-02 09:00:00,\n",
        )
        .await?;

    let res = server
        .client
        .post(server.url("/api/admin/load/it_tickets"))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["rows_loaded"], 2);

    let res = server
        .client
        .post(server.url("/api/admin/load/users"))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let stats: Value = server
        .client
        .get(server.url("/api/tickets/stats"))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    let high_resolved = stats["data"]
        .as_array()
        .and_then(|rows| {
            rows.iter()
                .find(|r| r["priority"] == "High" && r["status"] == "Resolved")
                .cloned()
        })
        .expect("High/Resolved row");
    assert_eq!(high_resolved["avg_resolution_hours"], 4.0);
    Ok(())
}

#[tokio::test]
async fn ticket_assignment_and_backlog() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.login(ADMIN.0, ADMIN.1).await?;
    let viewer = server.login(VIEWER.0, VIEWER.1).await?;

    server
        .write_data_file(
            "it_tickets.csv",
            "ticket_id,priority,description,status,assigned_to,created_at,resolution_time_hours\n\
             T-1,High,VPN down,Resolved,IT_Support_A,2024-11-01 08:00:00,4\n\
             T-2,Low,Mouse broken,Open,,2024-11-02 09:00:00,\n\
             T-3,Medium,Disk full,Open,IT_Support_B,2024-11-03 10:00:00,\n\
             T-4,Critical,Mail outage,In Progress,IT_Support_B,2024-11-04 11:00:00,\n",
        )
        .await?;
    server
        .client
        .post(server.url("/api/admin/load/it_tickets"))
        .bearer_auth(&admin)
        .send()
        .await?
        .error_for_status()?;

    let res = server
        .client
        .put(server.url("/api/tickets/T-2/assign"))
        .bearer_auth(&viewer)
        .json(&json!({ "assigned_to": "IT_Support_A" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .put(server.url("/api/tickets/T-2/assign"))
        .bearer_auth(&admin)
        .json(&json!({ "assigned_to": "  " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .put(server.url("/api/tickets/T-404/assign"))
        .bearer_auth(&admin)
        .json(&json!({ "assigned_to": "IT_Support_A" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let assigned: Value = server
        .client
        .put(server.url("/api/tickets/T-2/assign"))
        .bearer_auth(&admin)
        .json(&json!({ "assigned_to": "IT_Support_A" }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(assigned["data"]["assigned_to"], "IT_Support_A");

    let mine: Value = server
        .client
        .get(server.url("/api/tickets?assigned_to=IT_Support_B&status=In%20Progress"))
        .bearer_auth(&viewer)
        .send()
        .await?
        .json()
        .await?;
    let ids: Vec<_> = mine["data"]
        .as_array()
        .map(|rows| rows.iter().map(|r| r["ticket_id"].clone()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![json!("T-4")]);

    let backlog: Value = server
        .client
        .get(server.url("/api/tickets/backlog?limit=2"))
        .bearer_auth(&viewer)
        .send()
        .await?
        .json()
        .await?;
    let oldest: Vec<_> = backlog["data"]["oldest_pending"]
        .as_array()
        .map(|rows| rows.iter().map(|r| r["ticket_id"].clone()).collect())
        .unwrap_or_default();
    assert_eq!(oldest, vec![json!("T-2"), json!("T-3")]);

    let staff = backlog["data"]["by_staff"].as_array().cloned().unwrap_or_default();
    let count_for = |name: &str| {
        staff
            .iter()
            .find(|r| r["assigned_to"] == name)
            .map(|r| r["count"].clone())
    };
    assert_eq!(count_for("IT_Support_A"), Some(json!(1)));
    assert_eq!(count_for("IT_Support_B"), Some(json!(2)));

    let statuses = backlog["data"]["by_status"].as_array().cloned().unwrap_or_default();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0]["status"], "Open");
    assert_eq!(statuses[0]["count"], 2);
    assert!(statuses.iter().all(|r| r["status"] != "Resolved"));
    Ok(())
}

#[tokio::test]
async fn recent_datasets_newest_first() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(ANALYST.0, ANALYST.1).await?;

    for (id, date) in [("D-1", "2024-09-01"), ("D-2", "2024-11-01"), ("D-3", "2024-10-01")] {
        server
            .client
            .post(server.url("/api/datasets"))
            .bearer_auth(&token)
            .json(&json!({
                "dataset_id": id,
                "name": format!("dataset {}", id),
                "rows": 10,
                "columns": 2,
                "uploaded_by": ANALYST.0,
                "upload_date": date
            }))
            .send()
            .await?
            .error_for_status()?;
    }

    let recent: Value = server
        .client
        .get(server.url("/api/datasets/recent?limit=2"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let ids: Vec<_> = recent["data"]
        .as_array()
        .map(|rows| rows.iter().map(|r| r["dataset_id"].clone()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![json!("D-2"), json!("D-3")]);
    Ok(())
}

#[tokio::test]
async fn admin_clears_record_tables() -> Result<()> {
    let server = TestServer::start().await?;
    let analyst = server.login(ANALYST.0, ANALYST.1).await?;
    let admin = server.login(ADMIN.0, ADMIN.1).await?;

    server
        .client
        .post(server.url("/api/incidents"))
        .bearer_auth(&analyst)
        .json(&json!({
            "severity": "Low",
            "category": "Phishing",
            "description": "Suspicious mail"
        }))
        .send()
        .await?
        .error_for_status()?;

    let res = server
        .client
        .delete(server.url("/api/admin/records"))
        .bearer_auth(&analyst)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .delete(server.url("/api/admin/records"))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let cleared: Value = server
        .client
        .delete(server.url("/api/admin/records?confirm=true"))
        .bearer_auth(&admin)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(cleared["data"]["incidents"], 1);

    let incidents: Value = server
        .client
        .get(server.url("/api/incidents"))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(incidents["data"].as_array().map(Vec::len), Some(0));

    // accounts survive
    server.login(ANALYST.0, ANALYST.1).await?;
    Ok(())
}
