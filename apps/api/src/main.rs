use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hirewise::config::Config;
use hirewise::db::create_pool;
use hirewise::jobs::memory::MemoryJobStore;
use hirewise::jobs::store::{JobStore, PgJobStore};
use hirewise::llm_client::{LlmClient, TextProvider};
use hirewise::routes::build_router;
use hirewise::skills::extraction::HybridSkillExtractor;
use hirewise::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; malformed values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HireWise API v{}", env!("CARGO_PKG_VERSION"));

    // Job store: PostgreSQL when configured, in-memory otherwise
    let jobs: Arc<dyn JobStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            Arc::new(PgJobStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; jobs are kept in memory and lost on restart");
            Arc::new(MemoryJobStore::new())
        }
    };

    // Text provider is optional; skill extraction falls back to heuristics
    let text_provider: Option<Arc<dyn TextProvider>> = match LlmClient::from_config(&config.llm)
        .context("Failed to build LLM client")?
    {
        Some(client) => {
            info!("LLM client initialized (model: {})", client.model());
            Some(Arc::new(client))
        }
        None => {
            warn!("LLM_API_KEY not set; using heuristic skill extraction only");
            None
        }
    };

    let extractor = Arc::new(HybridSkillExtractor::new(text_provider.clone()));
    info!(
        "Skill bounds {}..={}, worker concurrency {}",
        config.skills.min, config.skills.max, config.skill_worker_concurrency
    );

    // Build app state and start the background skill worker
    let (state, worker) = AppState::build(jobs, text_provider, extractor, config.clone());
    worker.spawn();

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
