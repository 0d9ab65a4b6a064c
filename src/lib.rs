use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mediagrab_core::core::ytdlp::{self, MediaTool, Ytdlp};
use mediagrab_core::models::settings::AppSettings;
use tracing_subscriber::EnvFilter;

pub mod api;
pub mod messages;
pub mod session;
pub mod storage;

const DEFAULT_LOG_FILTER: &str = "mediagrab=info,mediagrab_lib=info,mediagrab_core=info,tower_http=info";

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub tool: Arc<dyn MediaTool>,
    pub sessions: session::SessionStore,
}

impl AppState {
    pub fn new(settings: AppSettings, tool: Arc<dyn MediaTool>) -> Self {
        let sessions = session::SessionStore::new(Duration::from_secs(settings.session.idle_timeout_secs));
        Self {
            settings: Arc::new(settings),
            tool,
            sessions,
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let settings = storage::config::load_settings();

    let ytdlp_path = ytdlp::ensure_ytdlp(&settings.tool)
        .await
        .context("yt-dlp is required to serve downloads")?;
    tracing::info!("Using yt-dlp at {}", ytdlp_path.display());

    let addr: SocketAddr = settings
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address: {}", settings.server.bind_address))?;

    let state = AppState::new(settings, Arc::new(Ytdlp::new(ytdlp_path)));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("mediagrab listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
