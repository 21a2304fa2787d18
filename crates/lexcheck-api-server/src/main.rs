use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use lexcheck_api_server::{
    build_router, config::Settings, services::GeminiClient, utils::logger::init_logger, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging; the guard flushes file logs on exit
    let _log_guard = init_logger(&settings.logging)?;

    info!("🚀 Starting LexCheck API Server...");
    info!(
        "✅ Configuration loaded (chunk size {}, overlap {})",
        settings.chunking.size, settings.chunking.overlap
    );
    if settings.gemini.api_key.is_none() {
        warn!("No server Gemini API key configured; requests must send x-gemini-api-key");
    }

    let llm = Arc::new(GeminiClient::new(&settings.gemini)?);

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    let state = AppState::new(settings, llm).await?;
    info!("✅ Services initialized");

    let app = build_router(state);

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
