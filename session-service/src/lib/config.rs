use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::session::models::SessionConfig;
use crate::domain::session::models::DEFAULT_ACCESS_TOKEN_TTL_SECS;
use crate::domain::session::models::DEFAULT_REFRESH_TOKEN_TTL_HOURS;
use crate::domain::session::models::DEFAULT_STORE_TIMEOUT_SECS;
use crate::domain::session::models::MAX_TOKEN_TTL_HOURS;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_token_ttl_hours")]
    pub refresh_token_ttl_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_hours", &self.refresh_token_ttl_hours)
            .finish()
    }
}

/// Which credential store backs the service.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local; state is lost on restart.
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CleanupConfig {
    #[serde(default = "default_cleanup_interval_secs")]
    pub interval_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_cleanup_interval_secs(),
        }
    }
}

fn default_access_token_ttl_secs() -> i64 {
    DEFAULT_ACCESS_TOKEN_TTL_SECS
}

fn default_refresh_token_ttl_hours() -> i64 {
    DEFAULT_REFRESH_TOKEN_TTL_HOURS
}

fn default_store_timeout_secs() -> u64 {
    DEFAULT_STORE_TIMEOUT_SECS
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, STORE__BACKEND, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// # Errors
    /// Fails when a source cannot be parsed or when the signing secret is
    /// missing or empty.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        Self::from_configuration(configuration)
    }

    fn from_configuration(configuration: ConfigBuilder) -> Result<Self, ConfigError> {
        let config: Config = configuration.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret must be set to a non-empty value".to_string(),
            ));
        }
        let max_ttl = Duration::hours(MAX_TOKEN_TTL_HOURS);
        check_ttl(
            "jwt.access_token_ttl_secs",
            Duration::try_seconds(self.jwt.access_token_ttl_secs),
            max_ttl,
        )?;
        check_ttl(
            "jwt.refresh_token_ttl_hours",
            Duration::try_hours(self.jwt.refresh_token_ttl_hours),
            max_ttl,
        )?;
        if self.cleanup.interval_secs == 0 {
            return Err(ConfigError::Message(
                "cleanup.interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings handed to the session service at construction.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.jwt.secret.as_bytes())
            .with_access_token_ttl(Duration::seconds(self.jwt.access_token_ttl_secs))
            .with_refresh_token_ttl(Duration::hours(self.jwt.refresh_token_ttl_hours))
            .with_store_timeout(StdDuration::from_secs(self.store.timeout_secs))
    }

    pub fn cleanup_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.cleanup.interval_secs)
    }
}

/// Token lifetimes must be positive and no longer than `max`.
fn check_ttl(key: &str, ttl: Option<Duration>, max: Duration) -> Result<(), ConfigError> {
    match ttl {
        Some(ttl) if ttl > Duration::zero() && ttl <= max => Ok(()),
        _ => Err(ConfigError::Message(format!(
            "{} must be positive and at most {} hours",
            key, MAX_TOKEN_TTL_HOURS
        ))),
    }
}
