//! HTTP listener settings

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;

/// Deployment stage.
///
/// Production switches logs to JSON and refuses a plain-http gateway URL.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub log_level: String,
    /// Upper bound for one request, gateway round trip included.
    pub request_timeout_secs: u64,
    /// Comma-separated browser origins allowed to call the checkout routes.
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_level: "info,checkout_engine=debug,sqlx=warn".to_string(),
            request_timeout_secs: 30,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ValidationError::BindAddress(addr.clone()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Configured origins, blanks skipped.
    pub fn cors_origins(&self) -> impl Iterator<Item = &str> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.socket_addr()?;
        if !(1..=120).contains(&self.request_timeout_secs) {
            return Err(ValidationError::RequestTimeout(self.request_timeout_secs));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(!config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unparsable_host_is_reported_with_the_address() {
        let config = ServerConfig {
            host: "checkout.local".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::BindAddress("checkout.local:8080".to_string()))
        );
    }

    #[test]
    fn request_timeout_must_leave_room_for_the_gateway() {
        for secs in [0, 121] {
            let config = ServerConfig {
                request_timeout_secs: secs,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::RequestTimeout(secs)));
        }
    }

    #[test]
    fn cors_origins_skip_blanks() {
        let config = ServerConfig {
            cors_origins: Some("https://app.example.com, ,http://localhost:5173,".to_string()),
            ..Default::default()
        };
        let origins: Vec<&str> = config.cors_origins().collect();
        assert_eq!(origins, ["https://app.example.com", "http://localhost:5173"]);
        assert_eq!(ServerConfig::default().cors_origins().count(), 0);
    }
}
