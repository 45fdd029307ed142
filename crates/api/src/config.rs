use std::path::PathBuf;
use std::str::FromStr;

/// Default cap on report attachments: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Credentials for the Owner account ensured at startup.
#[derive(Debug, Clone)]
pub struct BootstrapOwner {
    pub login: String,
    pub password: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    pub database_url: String,
    /// Root of the blob store (`avatars/`, `reports/`, `messages/`).
    pub data_dir: PathBuf,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted report attachment in bytes.
    pub max_upload_bytes: usize,
    pub bootstrap_owner: Option<BootstrapOwner>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                                  |
    /// |----------------------------|------------------------------------------|
    /// | `HOST`                     | `0.0.0.0`                                |
    /// | `PORT`                     | `8080`                                   |
    /// | `DATABASE_URL`             | `sqlite://./data/taskflow.db?mode=rwc`   |
    /// | `DATA_DIR`                 | `./data`                                 |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`                  |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                                     |
    /// | `MAX_UPLOAD_BYTES`         | `52428800`                               |
    /// | `BOOTSTRAP_OWNER_LOGIN`    | unset                                    |
    /// | `BOOTSTRAP_OWNER_PASSWORD` | unset                                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let cors_origins = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let bootstrap_owner = match (
            non_empty_env("BOOTSTRAP_OWNER_LOGIN"),
            non_empty_env("BOOTSTRAP_OWNER_PASSWORD"),
        ) {
            (Some(login), Some(password)) => Some(BootstrapOwner { login, password }),
            _ => None,
        };

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 8080)?,
            database_url: env_or("DATABASE_URL", "sqlite://./data/taskflow.db?mode=rwc"),
            data_dir: PathBuf::from(env_or("DATA_DIR", "./data")),
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            bootstrap_owner,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            database_url: "sqlite://./data/taskflow.db?mode=rwc".into(),
            data_dir: PathBuf::from("./data"),
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 30,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            bootstrap_owner: None,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}
