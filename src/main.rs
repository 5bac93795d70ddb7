//! Channel Relay Server - Binary Entry Point

use std::sync::Arc;

use log::info;

use channel_relay::{create_router, AppState, RelayResult, ServerConfig};

#[tokio::main]
async fn main() -> RelayResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();
    let state = Arc::new(AppState::new());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(
        "{} v{} listening on {}",
        channel_relay::NAME,
        channel_relay::VERSION,
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
