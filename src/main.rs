//! Composition root. Loads configuration, loads the catalog vector
//! index, wires the embedding/LLM clients into the search gateway and
//! orchestrator, and serves the HTTP surface (§6). Grounded on the
//! teacher's `start_server`/`create_router` shape — tracing init,
//! `Arc<AppState>`, permissive-by-default CORS layer via `tower_http`.

mod api;
mod assembler;
mod catalog;
mod config;
mod core;
mod embedding;
mod llm;
mod metrics;
mod models;
mod orchestrator;
mod query_validator;
mod search;
mod vocabulary;

use crate::api::AppState;
use crate::catalog::VectorIndex;
use crate::config::Config;
use crate::embedding::EmbeddingClient;
use crate::llm::LlmClient;
use crate::orchestrator::Orchestrator;
use crate::search::SearchGateway;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_with_env().unwrap_or_else(|_| Config::default());
    config.validate()?;

    init_tracing(&config.logging.level);

    info!("loading catalog index from {}", config.catalog.index_path);
    let index = VectorIndex::load(&config.catalog.index_path, &config.catalog.metadata_path)?;
    info!("catalog loaded: {} exercises", index.len());
    let index = Arc::new(index);

    let embedding_client = EmbeddingClient::new(
        config.embedding.base_url.clone(),
        config.embedding.model.clone(),
        config.embedding.api_key.clone(),
        Duration::from_secs(config.embedding.timeout_seconds),
    );

    let llm_client = Arc::new(LlmClient::new(
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.api_key.clone(),
        config.llm.temperature as f32,
        config.llm.max_tokens,
        Duration::from_secs(config.llm.timeout_seconds),
    ));

    let search_gateway = Arc::new(SearchGateway::new(
        embedding_client,
        Arc::clone(&index),
        Duration::from_secs(config.cache.ttl_seconds),
    ));

    let orchestrator = Orchestrator::new(Arc::clone(&search_gateway), Arc::clone(&llm_client));

    let state = Arc::new(AppState {
        orchestrator,
        catalog: Arc::clone(&index),
        llm_configured: !config.llm.base_url.is_empty(),
        embedding_configured: !config.embedding.base_url.is_empty(),
    });

    let cors = build_cors_layer(&config.server.cors_origins);
    let app = api::create_router(state).layer(cors);

    let address = config.get_server_address();
    info!("routine_synth listening on {address}");
    info!("  POST /analyze-journal   - single-day journal analysis");
    info!("  POST /recommend-routine - multi-day routine synthesis");
    info!("  POST /weekly-pattern    - weekly pattern analysis");
    info!("  GET  /health            - liveness probe");

    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let parsed: Vec<_> = origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new().allow_origin(AllowOrigin::list(parsed))
}
