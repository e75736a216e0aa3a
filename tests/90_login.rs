mod common;

use anyhow::Result;
use common::{TestServer, ADMIN};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn login_returns_token_and_session_state() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": ADMIN.0, "password": ADMIN.1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], true, "{}", body);
    let data = &body["data"];
    assert!(data["token"].as_str().map_or(false, |t| t.split('.').count() == 3));
    assert_eq!(data["role"], "admin");
    assert_eq!(data["session"]["is_admin"], true);
    assert!(data["expires_in"].as_i64().unwrap_or(0) > 0);
    Ok(())
}

#[tokio::test]
async fn login_without_body_is_client_error() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.client.post(server.url("/auth/login")).send().await?;
    assert!(res.status().is_client_error(), "got {}", res.status());
    Ok(())
}

#[tokio::test]
async fn empty_credentials_are_validation_errors() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "", "password": "" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = TestServer::start().await?;

    let body: Value = server.client.get(server.url("/")).send().await?.json().await?;
    assert_eq!(body["success"], true);
    assert!(body["data"]["endpoints"]["public_auth"].is_string());
    Ok(())
}
