use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::PostgresUnitOfWork;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 0;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is not set")]
    MissingUrl,

    #[error("{key} must be a non-negative integer, got `{value}`")]
    InvalidNumber { key: &'static str, value: String },
}

/// Connection settings for the shared PostgreSQL pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// Settings for `url` with the default pool limits.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Reads `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`,
    /// `DATABASE_MIN_CONNECTIONS` and `DATABASE_ACQUIRE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingUrl)?;

        let mut config = Self::new(url.trim());
        if let Some(max) = number(&lookup, "DATABASE_MAX_CONNECTIONS")? {
            config.max_connections = max;
        }
        if let Some(min) = number(&lookup, "DATABASE_MIN_CONNECTIONS")? {
            config.min_connections = min;
        }
        if let Some(secs) = number(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS")? {
            config.acquire_timeout = Duration::from_secs(secs.into());
        }
        Ok(config)
    }

    /// Opens the shared connection pool. Pool behavior beyond these
    /// settings is left to `sqlx`.
    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        tracing::debug!(
            max_connections = self.max_connections,
            min_connections = self.min_connections,
            "connecting to database"
        );
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.url)
            .await
    }

    /// Opens the pool and wraps it in an idle unit of work.
    pub async fn connect_unit_of_work(&self) -> Result<PostgresUnitOfWork, sqlx::Error> {
        let pool = self.connect().await?;
        Ok(PostgresUnitOfWork::from_pool(Arc::new(pool)))
    }
}

fn number<F>(lookup: &F, key: &'static str) -> Result<Option<u32>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}
