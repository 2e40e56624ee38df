//! Axum route handlers for the Chat API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chat::orchestrator::fold_resume;
use crate::errors::AppError;
use crate::models::conversation::ConversationTurn;
use crate::resume::document_text;
use crate::resume::upload::UploadForm;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatWithCvResponse {
    pub response: String,
    pub success: bool,
    /// Whether résumé text made it into the conversation context.
    pub cv_included: bool,
}

/// POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let response = state
        .chat
        .chat(&request.message, &request.conversation_history)
        .await?;

    Ok(Json(ChatResponse {
        response,
        success: true,
    }))
}

/// POST /api/chat/with-cv
///
/// Multipart form: `message`, optional `conversation_history` (JSON array),
/// optional `file` (PDF). A PDF that cannot be read degrades to plain chat.
pub async fn handle_chat_with_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ChatWithCvResponse>, AppError> {
    let form = UploadForm::read(multipart).await?;

    let message = form.field("message").unwrap_or_default().to_string();
    if message.is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let history = match form.field("conversation_history").map(str::trim) {
        None | Some("") => Vec::new(),
        Some(raw) => serde_json::from_str::<Vec<ConversationTurn>>(raw).map_err(|e| {
            AppError::Validation(format!("conversation_history is not valid JSON: {e}"))
        })?,
    };

    let mut cv_included = false;
    let mut prompt_message = message.clone();

    if let Some(file) = form.file {
        // Only the format is a client error; unreadable content degrades to plain chat.
        if !file.is_pdf() {
            return Err(AppError::Validation("Only PDF files are accepted".to_string()));
        }
        match document_text(file.bytes).await {
            Ok(text) if !text.trim().is_empty() => {
                info!("Folding CV '{}' into chat ({} chars)", file.file_name, text.len());
                prompt_message = fold_resume(&message, &text);
                cv_included = true;
            }
            Ok(_) => warn!("CV '{}' has no extractable text, chatting without it", file.file_name),
            Err(e) => warn!("CV extraction failed, chatting without it: {e}"),
        }
    }

    let response = state.chat.chat(&prompt_message, &history).await?;

    Ok(Json(ChatWithCvResponse {
        response,
        success: true,
        cv_included,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::conversation::Role;

    #[test]
    fn test_chat_request_history_defaults_to_empty() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "Xin chào"}"#).unwrap();
        assert_eq!(request.message, "Xin chào");
        assert!(request.conversation_history.is_empty());
    }

    #[test]
    fn test_chat_request_with_history() {
        let json = r#"{
            "message": "Tôi muốn tìm việc lập trình Python",
            "conversation_history": [
                {"role": "user", "content": "Xin chào"},
                {"role": "assistant", "content": "Chào bạn! Tôi có thể giúp gì?"}
            ]
        }"#;
        let request: ChatRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.conversation_history.len(), 2);
        assert_eq!(request.conversation_history[1].role, Role::Assistant);
    }
}
