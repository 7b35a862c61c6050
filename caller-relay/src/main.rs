use anyhow::{Context, Result};
use caller_relay::{RelayConfig, RelayService, router};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = RelayConfig::parse();
    let service = RelayService::new();
    let app = router(service, &config.ws_path);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Signaling relay listening on ws://{}{}", config.bind, config.ws_path);

    axum::serve(listener, app).await.context("Relay server failed")?;
    Ok(())
}
