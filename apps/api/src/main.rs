mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::interview::engine::InterviewEngine;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{InterviewStore, MemoryInterviewStore, PgInterviewStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interviewer v{}", env!("CARGO_PKG_VERSION"));

    // Interview storage: Postgres when configured, process memory otherwise
    let store: Arc<dyn InterviewStore> = match &config.database_url {
        Some(url) => Arc::new(PgInterviewStore::new(create_pool(url).await?)),
        None => {
            info!("DATABASE_URL not set; interviews are kept in memory");
            Arc::new(MemoryInterviewStore::new())
        }
    };

    let llm = LlmClient::new(config.llm_settings())?;
    info!("LLM client initialized (model: {})", llm.model());
    let llm: Arc<dyn TextGenerator> = Arc::new(llm);

    info!("Question category cycle: {:?}", config.category_cycle);
    let engine = InterviewEngine::new(llm.clone(), store, config.category_cycle);

    let state = AppState { llm, engine };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
