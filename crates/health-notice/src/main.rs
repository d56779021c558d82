//! `health-notice`: keeps a heartbeat session with the health endpoint and
//! shows the notices it pushes.
//!
//! Environment:
//! - `HEALTH_NOTICE_ENDPOINT`: WebSocket URL (default `ws://socket.art2cat.com/ws/health`)
//! - `HEALTH_NOTICE_ICON`: icon for desktop notifications
//! - `RUST_LOG`: log filter (default `info`)

use std::env;

use health_notice::{ENDPOINT_ENV, ICON_ENV, NoticeSession, config_for, sink_from_env};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config_for(env::var(ENDPOINT_ENV).ok());
    let sink = sink_from_env(env::var(ICON_ENV).ok());

    let session = NoticeSession::with_shared_sink(config, sink);
    info!(url = %session.url(), "starting health-notice client");
    session.connect()?;

    wait_for_shutdown().await?;

    info!("shutting down");
    session.shutdown().await;
    info!("goodbye");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
