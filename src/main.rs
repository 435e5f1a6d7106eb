//! Proxy entry point.
//!
//! Loads the YAML configuration named by the first CLI argument, wires
//! the configuration manager, health checker, and forwarding engine
//! together, and serves until the process is told to stop. SIGHUP
//! reloads the configuration; ctrl-c shuts down.

use std::sync::Arc;
use switchyard::proxy::BackendClient;
use switchyard::{ConfigManager, HealthChecker, HttpClient, Proxy, YamlFileSource};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "switchyard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    let manager = Arc::new(ConfigManager::new(Box::new(YamlFileSource::new(
        &config_path,
    )))?);
    let port = manager.latest().port;

    tracing::info!(
        config = %config_path,
        port,
        "configuration loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let client: Arc<dyn BackendClient> = Arc::new(HttpClient::new());

    let checker = Arc::new(HealthChecker::new(Arc::clone(&client)));
    checker.start(manager.latest(), manager.subscribe(), shutdown_rx.clone());
    manager.start(shutdown_rx.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    let proxy = Proxy::new(manager, checker, client);
    proxy.serve(listener, shutdown_rx).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
