use std::path::Path;

use crate::auth::PasswordHasher;
use crate::config::AppConfig;
use crate::credentials::open_credential_store;
use crate::database::DatabaseManager;
use crate::services::UserService;

/// What every subcommand works against: the resolved config, an open
/// database with the schema in place, and the configured credential store.
pub struct CliContext {
    pub config: AppConfig,
    pub db: DatabaseManager,
    pub users: UserService,
}

impl CliContext {
    pub async fn open(database_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = crate::config::config().clone();
        if let Some(path) = database_override {
            config.database.path = path.to_path_buf();
        }

        let db = DatabaseManager::connect(&config.database).await?;
        db.initialize_schema().await?;

        let store = open_credential_store(
            config.storage.credential_backend,
            &db,
            &config.storage.credential_file,
        );
        let users = UserService::new(store, PasswordHasher::new(config.security.bcrypt_cost));

        Ok(Self { config, db, users })
    }
}
