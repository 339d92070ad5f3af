use anyhow::Context;
use tokio::net::TcpListener;

use edge_media_server::config::ServerConfig;
use edge_media_server::logging::init_tracing;
use edge_media_server::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format).context("failed to initialize tracing")?;

    let state = AppState::from_config(&config).await?;
    let app = router(config.mode, state, &config.static_dir);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        mode = ?config.mode,
        require_auth = config.require_auth,
        main_domain = %config.main_domain,
        "edge-media-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("edge-media-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
