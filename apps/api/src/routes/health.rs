use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
/// Liveness probe.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "AI JobHunter Chatbot is running!",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /api/health
/// Reports the selected backend and whether its credential is present.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "ai_service": state.config.ai_service.as_str(),
        "credentials_configured": state.config.active_api_key().is_some(),
        "backend_initialized": state.chat.backend().is_initialized()
    }))
}
