//! Typed configuration read from the environment.
//!
//! Variables use the `CHECKOUT` prefix with `__` between section and key,
//! and a `.env` file is honoured in development:
//!
//! ```text
//! CHECKOUT__SERVER__PORT=8080
//! CHECKOUT__DATABASE__URL=postgres://checkout@localhost/checkout
//! CHECKOUT__PAGARME__SECRET_KEY=sk_test_...
//! CHECKOUT__PAGARME__PUBLIC_KEY=pk_test_...
//! CHECKOUT__PAGARME__WEBHOOK_SECRET=...
//! ```
//!
//! Only the `pagarme` keys are required.

mod database;
mod error;
mod payment;
mod server;

use std::collections::HashMap;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

const ENV_PREFIX: &str = "CHECKOUT";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub pagarme: PaymentConfig,
}

impl AppConfig {
    /// Reads `.env` and the process environment, then validates.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_source(None)
    }

    /// Same as [`load`](Self::load) over an explicit variable map instead
    /// of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_env_source(Some(vars))
    }

    fn from_env_source(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let config: AppConfig = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .source(vars),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.pagarme.validate(self.is_production())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
