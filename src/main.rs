use checkout_engine::config::AppConfig;
use checkout_engine::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    server::init_tracing(&config.server);
    tracing::info!(?config, "Configuration loaded");

    server::run(config).await
}
