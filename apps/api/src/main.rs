mod catalog;
mod config;
mod errors;
mod interview;
mod llm_client;
mod realtime;
mod routes;
mod session;
mod sse;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::JobCatalog;
use crate::config::Config;
use crate::llm_client::{ChatProvider, GeminiClient, OpenAiClient};
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

const SESSION_SWEEP_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mockview API v{}", env!("CARGO_PKG_VERSION"));

    let catalog = JobCatalog::new(config.jobs_csv_path.clone());
    info!("Job catalog at {}", catalog.path().display());

    let openai: Option<Arc<dyn ChatProvider>> = match &config.openai_api_key {
        Some(key) => {
            let client = OpenAiClient::new(key.clone(), config.openai_model.clone())?;
            info!("OpenAI client initialized (model: {})", client.model());
            Some(Arc::new(client))
        }
        None => {
            warn!("OPENAI_API_KEY not set; guide and streamed chat will answer 500");
            None
        }
    };

    let gemini: Option<Arc<dyn ChatProvider>> = match &config.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(key.clone(), config.gemini_model.clone())?;
            info!("Gemini client initialized (model: {})", client.model());
            Some(Arc::new(client))
        }
        None => {
            warn!("GEMINI_API_KEY not set; chat, feedback and live voice will answer 500");
            None
        }
    };

    let sessions = SessionStore::new(Duration::from_secs(config.session_idle_timeout_secs));
    sessions.spawn_sweeper(Duration::from_secs(SESSION_SWEEP_SECS));

    let state = AppState {
        config: config.clone(),
        catalog,
        openai,
        gemini,
        sessions,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
