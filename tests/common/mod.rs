#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

use intel_platform::auth::{session_ttl, PasswordHasher, Role};
use intel_platform::credentials::SqliteCredentialStore;
use intel_platform::database::DatabaseManager;
use intel_platform::server::{router, AppState, ServerSettings};
use intel_platform::services::UserService;

pub const ADMIN: (&str, &str) = ("admin", "AdminPass1!");
pub const ANALYST: (&str, &str) = ("analyst1", "AnalystPass1!");
pub const VIEWER: (&str, &str) = ("viewer1", "ViewerPass1!");

/// An in-process server on its own port, database and data directory.
/// Dropped with the test, along with everything on disk.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    pub state: AppState,
    dir: TempDir,
}

pub struct Options {
    pub allow_self_registration: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allow_self_registration: true,
        }
    }
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(Options::default()).await
    }

    pub async fn start_with(options: Options) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let db = DatabaseManager::open(dir.path().join("platform.db"), 4, 5).await?;
        db.initialize_schema().await?;

        let users = UserService::new(
            Arc::new(SqliteCredentialStore::new(db.pool().clone())),
            PasswordHasher::new(4),
        );
        let settings = ServerSettings {
            jwt_secret: "integration-test-secret".to_string(),
            session_ttl: session_ttl(1),
            allow_self_registration: options.allow_self_registration,
            data_dir: dir.path().join("data"),
            max_request_size_bytes: 1024 * 1024,
            enable_request_logging: false,
        };
        let state = AppState::new(db, users, settings);

        for (username, password, role) in [
            (ADMIN.0, ADMIN.1, Role::Admin),
            (ANALYST.0, ANALYST.1, Role::Analyst),
            (VIEWER.0, VIEWER.1, Role::User),
        ] {
            state.users.register(username, password, role).await?;
        }

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            state,
            dir,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn data_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("data")
    }

    pub async fn write_data_file(&self, name: &str, content: &str) -> Result<()> {
        let dir = self.data_dir();
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(Path::new(&dir).join(name), content).await?;
        Ok(())
    }

    /// POST /auth/login and return the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }
}
