//! Configuration for the IBP CLI
//!
//! Settings are read from the environment once at startup (after loading a
//! `.env` file when present) and passed explicitly into the storage and
//! loader components; nothing looks up configuration ambiently later.

use anyhow::Context;
use ibp_ingest::loader::IngestOptions;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/invoice_billing";

/// Default maximum database connections in the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// CLI settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Postgres connection URL
    pub database_url: String,

    /// Connection pool size
    pub max_connections: u32,

    /// Pool acquire timeout in seconds
    pub connect_timeout_secs: u64,

    /// Loader tuning (column width, batch size, version tag)
    pub ingest: IngestOptions,
}

impl Settings {
    /// Load settings from `.env` and environment variables.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut ingest = IngestOptions::default();

        if let Ok(cols) = std::env::var("IBP_EXPECTED_COLS") {
            ingest.expected_cols = cols
                .parse()
                .context("IBP_EXPECTED_COLS must be a positive integer")?;
        }

        if let Ok(batch) = std::env::var("IBP_BATCH_SIZE") {
            ingest.batch_size = batch
                .parse()
                .context("IBP_BATCH_SIZE must be a positive integer")?;
        }

        if let Ok(version) = std::env::var("IBP_LOADER_VERSION") {
            ingest.loader_version = version;
        }

        let settings = Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_env(
                "IBP_MAX_CONNECTIONS",
                std::env::var("IBP_MAX_CONNECTIONS").ok(),
                DEFAULT_MAX_CONNECTIONS,
            )?,
            connect_timeout_secs: parse_env(
                "IBP_CONNECT_TIMEOUT",
                std::env::var("IBP_CONNECT_TIMEOUT").ok(),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
            ingest,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.max_connections == 0 {
            anyhow::bail!("IBP_MAX_CONNECTIONS must be greater than 0");
        }

        if self.ingest.expected_cols == 0 {
            anyhow::bail!("IBP_EXPECTED_COLS must be greater than 0");
        }

        if self.ingest.batch_size == 0 {
            anyhow::bail!("IBP_BATCH_SIZE must be greater than 0");
        }

        Ok(())
    }

    /// Open the connection pool used for the whole command invocation.
    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .connect(&self.database_url)
            .await
            .context("Failed to connect to database. Check DATABASE_URL.")?;

        Ok(pool)
    }
}

/// Parse an optional environment value, erroring on malformed input rather
/// than silently falling back to the default.
fn parse_env<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> anyhow::Result<T> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a positive integer", name)),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_rejects_malformed_value() {
        assert!(parse_env::<u32>("IBP_MAX_CONNECTIONS", Some("five".to_string()), 5).is_err());
        assert!(parse_env::<u64>("IBP_CONNECT_TIMEOUT", Some("-1".to_string()), 10).is_err());
    }

    #[test]
    fn test_parse_env_value_or_default() {
        assert_eq!(parse_env("IBP_MAX_CONNECTIONS", Some("20".to_string()), 5u32).unwrap(), 20);
        assert_eq!(parse_env("IBP_CONNECT_TIMEOUT", None, 10u64).unwrap(), 10);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut settings = Settings {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            ingest: IngestOptions::default(),
        };
        assert!(settings.validate().is_ok());

        settings.ingest.batch_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let settings = Settings {
            database_url: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            ingest: IngestOptions::default(),
        };
        assert!(settings.validate().is_err());
    }
}
