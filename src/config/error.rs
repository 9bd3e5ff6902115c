//! Configuration errors

use thiserror::Error;

/// Reading or checking [`AppConfig`](super::AppConfig) failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// A value that deserialized fine but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("cannot bind to '{0}'")]
    BindAddress(String),

    #[error("request timeout of {0}s is outside 1..=120")]
    RequestTimeout(u64),

    #[error("database URL must use the postgres:// or postgresql:// scheme")]
    DatabaseScheme,

    #[error("connection pool {min}..={max} is invalid (at most 100 connections)")]
    PoolSize { min: u32, max: u32 },

    #[error("{field} must start with '{prefix}'")]
    KeyPrefix {
        field: &'static str,
        prefix: &'static str,
    },

    #[error("gateway URL '{0}' is not http(s)")]
    ApiBaseUrl(String),

    #[error("gateway URL must use https in production")]
    InsecureApiBaseUrl,

    #[error("PIX expiry of {0}s is outside 60s..=7d")]
    PixExpiry(u32),
}
