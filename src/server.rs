use axum::{middleware, routing::get, Router};
use chrono::Duration;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use crate::auth::{session_ttl, PasswordHasher, SessionRegistry};
use crate::config::AppConfig;
use crate::credentials::open_credential_store;
use crate::database::DatabaseManager;
use crate::handlers;
use crate::middleware::{require_admin_middleware, session_auth_middleware};
use crate::services::{DatasetService, IncidentService, TicketService, UserService};

/// Settings the handlers need at request time.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub allow_self_registration: bool,
    pub data_dir: PathBuf,
    pub max_request_size_bytes: usize,
    pub enable_request_logging: bool,
}

impl ServerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            jwt_secret: config.security.jwt_secret.clone(),
            session_ttl: session_ttl(config.security.session_expiry_hours),
            allow_self_registration: config.security.allow_self_registration,
            data_dir: config.storage.data_dir.clone(),
            max_request_size_bytes: config.api.max_request_size_bytes,
            enable_request_logging: config.api.enable_request_logging,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseManager,
    pub users: UserService,
    pub sessions: SessionRegistry,
    pub incidents: IncidentService,
    pub tickets: TicketService,
    pub datasets: DatasetService,
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(db: DatabaseManager, users: UserService, settings: ServerSettings) -> Self {
        let pool = db.pool().clone();
        Self {
            users,
            sessions: SessionRegistry::new(),
            incidents: IncidentService::new(pool.clone()),
            tickets: TicketService::new(pool.clone()),
            datasets: DatasetService::new(pool),
            settings: Arc::new(settings),
            db,
        }
    }

    /// Wire the configured credential backend and hasher over `db`.
    pub fn from_config(db: DatabaseManager, config: &AppConfig) -> Self {
        let store = open_credential_store(
            config.storage.credential_backend,
            &db,
            &config.storage.credential_file,
        );
        let users = UserService::new(store, PasswordHasher::new(config.security.bcrypt_cost));
        Self::new(db, users, ServerSettings::from_config(config))
    }
}

pub fn router(state: AppState) -> Router {
    let settings = state.settings.clone();

    let app = Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .merge(auth_public_routes())
        // Session required
        .merge(protected_routes(state.clone()))
        // Session + admin role required
        .merge(elevated_routes(state.clone()))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(settings.max_request_size_bytes))
        .layer(CorsLayer::permissive());

    if settings.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

fn auth_public_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use axum::routing::{post, put};
    use handlers::protected::{auth, records};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/password", put(auth::change_password))
        .route(
            "/api/incidents",
            get(records::incidents::list).post(records::incidents::create),
        )
        .route("/api/incidents/stats", get(records::incidents::stats))
        .route(
            "/api/incidents/:id",
            get(records::incidents::show).delete(records::incidents::delete),
        )
        .route("/api/incidents/:id/status", put(records::incidents::update_status))
        .route(
            "/api/tickets",
            get(records::tickets::list).post(records::tickets::create),
        )
        .route("/api/tickets/stats", get(records::tickets::stats))
        .route("/api/tickets/backlog", get(records::tickets::backlog))
        .route(
            "/api/tickets/:id",
            get(records::tickets::show).delete(records::tickets::delete),
        )
        .route("/api/tickets/:id/status", put(records::tickets::update_status))
        .route("/api/tickets/:id/assign", put(records::tickets::assign))
        .route(
            "/api/datasets",
            get(records::datasets::list).post(records::datasets::create),
        )
        .route("/api/datasets/stats", get(records::datasets::stats))
        .route("/api/datasets/recent", get(records::datasets::recent))
        .route(
            "/api/datasets/:id",
            get(records::datasets::show).delete(records::datasets::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, session_auth_middleware))
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    use axum::routing::{delete, post};
    use handlers::elevated;

    Router::new()
        .route(
            "/api/admin/users",
            get(elevated::users::list).post(elevated::users::create),
        )
        .route("/api/admin/load/:table", post(elevated::load::load_table))
        .route("/api/admin/records", delete(elevated::records::clear))
        .route_layer(middleware::from_fn(require_admin_middleware))
        .route_layer(middleware::from_fn_with_state(state, session_auth_middleware))
}

/// Open the database, run bootstrap, and serve until ctrl-c.
pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let db = DatabaseManager::connect(&config.database).await?;
    db.initialize_schema().await?;

    let state = AppState::from_config(db.clone(), config);
    let report = state
        .users
        .bootstrap(&config.storage.legacy_user_file, &config.bootstrap)
        .await?;
    info!(
        migrated = ?report.migrated,
        admin_created = report.admin_created,
        "credential bootstrap finished"
    );

    if crate::is_production!() && config.bootstrap.admin_password.is_some() {
        warn!("BOOTSTRAP_ADMIN_PASSWORD is set in production; unset it once the admin exists");
    }

    let sweeper = spawn_session_sweeper(state.sessions.clone());
    let app = router(state);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;
    info!("Intel platform listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    db.close().await;
    Ok(())
}

const SESSION_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(300);

fn spawn_session_sweeper(sessions: SessionRegistry) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                debug!(purged, "expired sessions purged");
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    info!("shutdown signal received");
}
