use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub session_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub allow_self_registration: bool,
}

/// Which backend holds canonical credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    Sqlite,
    File,
}

impl std::str::FromStr for CredentialBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "db" | "database" => Ok(CredentialBackend::Sqlite),
            "file" | "flatfile" | "text" => Ok(CredentialBackend::File),
            other => Err(format!("unknown credential backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub credential_backend: CredentialBackend,
    /// Credential file used when the backend is `file`.
    pub credential_file: PathBuf,
    /// Legacy `users.txt` imported once at bootstrap.
    pub legacy_user_file: PathBuf,
    /// Directory holding the CSV seed files.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub admin_username: String,
    #[serde(skip_serializing)]
    pub admin_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_BUSY_TIMEOUT_SECS") {
            self.database.busy_timeout_secs = v.parse().unwrap_or(self.database.busy_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.trim().is_empty() {
                self.security.jwt_secret = v;
            }
        }
        if let Ok(v) = env::var("SECURITY_SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_ALLOW_SELF_REGISTRATION") {
            self.security.allow_self_registration = v.parse().unwrap_or(self.security.allow_self_registration);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_CREDENTIAL_BACKEND") {
            self.storage.credential_backend = v.parse().unwrap_or(self.storage.credential_backend);
        }
        if let Ok(v) = env::var("STORAGE_CREDENTIAL_FILE") {
            self.storage.credential_file = PathBuf::from(v);
        }
        if let Ok(v) = env::var("STORAGE_LEGACY_USER_FILE") {
            self.storage.legacy_user_file = PathBuf::from(v);
        }
        if let Ok(v) = env::var("STORAGE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }

        // API overrides
        if let Ok(v) = env::var("INTEL_API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Bootstrap overrides
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_USERNAME") {
            self.bootstrap.admin_username = v;
        }
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = Some(v).filter(|p| !p.is_empty());
        }

        self
    }

    fn storage_defaults() -> StorageConfig {
        StorageConfig {
            credential_backend: CredentialBackend::Sqlite,
            credential_file: PathBuf::from("DATA/credentials.txt"),
            legacy_user_file: PathBuf::from("DATA/users.txt"),
            data_dir: PathBuf::from("DATA"),
        }
    }

    /// Per-process random secret; sessions live in memory so a restart drops them anyway.
    fn ephemeral_secret() -> String {
        format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                path: PathBuf::from("DATA/intelligence_platform.db"),
                max_connections: 5,
                busy_timeout_secs: 5,
            },
            security: SecurityConfig {
                jwt_secret: Self::ephemeral_secret(),
                session_expiry_hours: 24,
                bcrypt_cost: 10,
                allow_self_registration: true,
            },
            storage: Self::storage_defaults(),
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            bootstrap: BootstrapConfig {
                admin_username: "admin".to_string(),
                admin_password: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                path: PathBuf::from("DATA/intelligence_platform.db"),
                max_connections: 5,
                busy_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: Self::ephemeral_secret(),
                session_expiry_hours: 8,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                allow_self_registration: true,
            },
            storage: Self::storage_defaults(),
            api: ApiConfig {
                port: 8080,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            bootstrap: BootstrapConfig {
                admin_username: "admin".to_string(),
                admin_password: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                path: PathBuf::from("/var/lib/intel-platform/intelligence_platform.db"),
                max_connections: 8,
                busy_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: Self::ephemeral_secret(),
                session_expiry_hours: 4,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                allow_self_registration: false,
            },
            storage: StorageConfig {
                credential_backend: CredentialBackend::Sqlite,
                credential_file: PathBuf::from("/var/lib/intel-platform/credentials.txt"),
                legacy_user_file: PathBuf::from("/var/lib/intel-platform/users.txt"),
                data_dir: PathBuf::from("/var/lib/intel-platform/data"),
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            bootstrap: BootstrapConfig {
                admin_username: "admin".to_string(),
                admin_password: None,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
