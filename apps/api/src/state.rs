use std::sync::Arc;

use crate::chat::orchestrator::ChatOrchestrator;
use crate::config::Config;
use crate::retrieval::SemanticIndex;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once in `main`; everything in it is read-only or internally synchronised.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Chat façade holding the retriever and the resolved backend handle.
    pub chat: Arc<ChatOrchestrator>,
    /// Direct index access for job registration and CV recommendations.
    pub index: Arc<dyn SemanticIndex>,
}
