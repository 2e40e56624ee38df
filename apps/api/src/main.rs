mod chat;
mod config;
mod errors;
mod llm_client;
mod models;
mod resume;
mod retrieval;
mod routes;
mod state;

use anyhow::Result;
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::orchestrator::ChatOrchestrator;
use crate::config::Config;
use crate::llm_client::BackendHandle;
use crate::retrieval::chroma::{ChromaIndex, ChromaLocation};
use crate::retrieval::embeddings;
use crate::retrieval::{GroundingRetriever, SemanticIndex};
use crate::routes::build_router;
use crate::state::AppState;

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

    info!("Starting JobHunter API v{}", env!("CARGO_PKG_VERSION"));

    // Embeddings are computed here; Chroma only stores and compares them
    let embedding_config = config.embedding_config();
    if embedding_config.api_key.is_none() {
        warn!(
            "No API key configured for {} embeddings; vector operations will fail",
            embedding_config.kind.as_str()
        );
    }
    let embedder = embeddings::configure(&embedding_config)?;

    // Vector index; the collection is resolved lazily on first use
    let location = ChromaLocation {
        base_url: config.vector_db_url.clone(),
        tenant: config.chroma_tenant.clone(),
        database: config.chroma_database.clone(),
        collection: config.vector_collection.clone(),
    };
    let index: Arc<dyn SemanticIndex> = Arc::new(ChromaIndex::new(&location, embedder)?);
    info!(
        "Vector index configured ({} / {}/{} / {})",
        location.base_url, location.tenant, location.database, location.collection
    );

    // Model backend is constructed on the first chat request
    let backend = BackendHandle::new(config.ai_service, config.backend_config());
    if config.active_api_key().is_none() {
        warn!(
            "No API key configured for {}; chat requests will fail until one is set",
            config.ai_service.as_str()
        );
    }
    info!(
        "Model backend selected: {} ({})",
        config.ai_service.as_str(),
        config.ai_model
    );

    let chat = ChatOrchestrator::new(GroundingRetriever::new(index.clone()), Arc::new(backend));

    let state = AppState {
        config: Arc::new(config.clone()),
        chat: Arc::new(chat),
        index,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.allowed_origins));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Allows credentials from the configured origins only. Origins that are not
/// valid header values are skipped with a warning.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}
