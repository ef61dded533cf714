use std::sync::Arc;

use anyhow::{Context, Result};
use material_hooks::config::Config;
use material_hooks::secret::RotatingSecret;
use material_hooks::server::{AppState, build_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = config.material_registry();
    tracing::info!(
        materials = registry.materials().len(),
        dispatch_timeout_seconds = config.dispatch_timeout_seconds,
        "Loaded configuration"
    );

    let app_state = AppState::new(
        Arc::new(RotatingSecret::new(config.webhook_secret.clone())),
        Arc::new(registry),
        config.dispatch_timeout(),
    );
    let app = build_router(app_state);

    let addr = config.parse_server_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
