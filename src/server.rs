//! Process bootstrap: logging, storage selection and the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::{routing::get, Router};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::adapters::http::{checkout_router, CheckoutAppState};
use crate::adapters::memory::{InMemoryCatalog, InMemoryPaymentLedger, InMemorySubscriptionStore};
use crate::adapters::pagarme::{PagarmeConfig, PagarmePaymentAdapter};
use crate::adapters::postgres::{
    PostgresCatalogReader, PostgresPaymentLedger, PostgresSubscriptionRepository,
};
use crate::config::{AppConfig, DatabaseConfig, PaymentConfig, ServerConfig};
use crate::ports::{GatewayError, PaymentGateway};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter; production logs are JSON.
pub fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if server.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Builds the Pagar.me adapter from its configuration section.
pub fn pagarme_gateway(config: &PaymentConfig) -> Result<PagarmePaymentAdapter, GatewayError> {
    PagarmePaymentAdapter::new(
        PagarmeConfig::new(
            config.secret_key.expose_secret().clone(),
            config.public_key.clone(),
            config.webhook_secret.expose_secret().clone(),
        )
        .with_base_url(config.api_base_url.clone())
        .with_statement_descriptor(config.statement_descriptor.clone()),
    )
}

/// Wires the stores: PostgreSQL when a URL is configured, in-memory otherwise.
pub async fn build_state(
    config: &AppConfig,
    gateway: Arc<dyn PaymentGateway>,
) -> Result<CheckoutAppState> {
    let pix_expires_in = config.pagarme.pix_expires_in_secs;

    if !config.database.is_configured() {
        tracing::warn!("No database URL configured; using in-memory stores with an empty catalog");
        return Ok(CheckoutAppState {
            catalog: Arc::new(InMemoryCatalog::new()),
            ledger: Arc::new(InMemoryPaymentLedger::new()),
            subscriptions: Arc::new(InMemorySubscriptionStore::new()),
            gateway,
            pix_expires_in,
        });
    }

    let pool = connect(&config.database).await?;
    Ok(CheckoutAppState {
        catalog: Arc::new(PostgresCatalogReader::new(pool.clone())),
        ledger: Arc::new(PostgresPaymentLedger::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool)),
        gateway,
        pix_expires_in,
    })
}

async fn connect(config: &DatabaseConfig) -> Result<sqlx::PgPool> {
    let url = config.url().context("Database URL is not set")?;
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect(url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    tracing::info!("Postgres connection has been established");

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        tracing::info!("Migrations applied");
    }
    Ok(pool)
}

/// The full HTTP application with middleware.
pub fn app(state: CheckoutAppState, server: &ServerConfig) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);
    let origins: Vec<HeaderValue> = server
        .cors_origins()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    if !origins.is_empty() {
        cors = cors.allow_origin(origins);
    }

    checkout_router()
        .route("/health-check", get(|| async { "OK" }))
        .with_state(state)
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serves until ctrl-c or SIGTERM.
pub async fn run(config: AppConfig) -> Result<()> {
    let gateway: Arc<dyn PaymentGateway> = Arc::new(pagarme_gateway(&config.pagarme)?);
    let state = build_state(&config, gateway).await?;
    let app = app(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, test_mode = config.pagarme.is_test_mode(), "Checkout server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received ctrl+C signal"),
        _ = terminate => tracing::info!("Received terminate signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pagarme::MockPaymentGateway;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> CheckoutAppState {
        CheckoutAppState {
            catalog: Arc::new(InMemoryCatalog::new()),
            ledger: Arc::new(InMemoryPaymentLedger::new()),
            subscriptions: Arc::new(InMemorySubscriptionStore::new()),
            gateway: Arc::new(MockPaymentGateway::new()),
            pix_expires_in: 3600,
        }
    }

    #[tokio::test]
    async fn health_check_answers_ok() {
        let response = app(state(), &ServerConfig::default())
            .oneshot(
                Request::builder()
                    .uri("/health-check")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
