use analysis_service::{config::AppConfig, metrics_server, observability, server};
use anyhow::{Context, Result};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let addr: SocketAddr = cfg
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("invalid server.bind_addr '{}'", cfg.server.bind_addr))?;

    tracing::info!(
        %addr,
        top_n = cfg.analysis.top_n,
        location_column = %cfg.analysis.location_column,
        required_fields = ?cfg.analysis.required_fields,
        "starting AMR analysis service"
    );

    let app = server::router(cfg.analysis, cfg.server.max_body_bytes);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
