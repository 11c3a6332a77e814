mod auth;
mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod models;
mod resume;
mod routes;
mod speech;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::interview::store::PgSessionStore;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::speech::synthesis::MurfClient;
use crate::speech::transcription::DeepgramClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Intervox API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    ensure_schema(&pool).await?;

    // Provider adapters are constructed once here and injected everywhere
    // through AppState; nothing below main holds configuration or secrets.
    let state = AppState {
        store: Arc::new(PgSessionStore::new(pool)),
        llm: Arc::new(GeminiClient::new(config.gemini_api_key.clone(), None)),
        synthesizer: Arc::new(MurfClient::new(config.murf_api_key.clone(), None)),
        transcriber: Arc::new(DeepgramClient::new(config.deepgram_api_key.clone(), None)),
    };
    info!(
        "Provider adapters initialized (generation model: {})",
        llm_client::MODEL
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
