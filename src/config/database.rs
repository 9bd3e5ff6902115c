//! PostgreSQL settings
//!
//! The whole section is optional. Without a URL the service runs on the
//! in-memory stores, which is how local runs and the test suites work.

use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

const MAX_POOL_SIZE: u32 = 100;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL; carries the password, so kept secret.
    pub url: Option<Secret<String>>,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Apply `migrations/` at startup.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            min_connections: 2,
            max_connections: 10,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 600,
            run_migrations: false,
        }
    }
}

impl DatabaseConfig {
    /// The URL when one is set and not blank.
    pub fn url(&self) -> Option<&str> {
        self.url
            .as_ref()
            .map(|url| url.expose_secret().as_str())
            .filter(|url| !url.trim().is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.url().is_some()
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_connections == 0
            || self.min_connections > self.max_connections
            || self.max_connections > MAX_POOL_SIZE
        {
            return Err(ValidationError::PoolSize {
                min: self.min_connections,
                max: self.max_connections,
            });
        }
        match self.url() {
            Some(url) if !url.starts_with("postgres://") && !url.starts_with("postgresql://") => {
                Err(ValidationError::DatabaseScheme)
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("min_connections", &self.min_connections)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}
