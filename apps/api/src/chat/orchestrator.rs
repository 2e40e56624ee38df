//! Conversation orchestration — the chat façade.
//!
//! Flow: validate → retrieve grounding (fail-open) → assemble prompt →
//!       active backend → reply text, returned verbatim.
//!
//! Retrieval problems never reach the caller. Backend problems always do,
//! as a single `AppError` carrying the provider's description.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::assembler::build_prompt;
use crate::chat::prompts::RESUME_CONTEXT_HEADER;
use crate::errors::AppError;
use crate::llm_client::BackendHandle;
use crate::models::conversation::ConversationTurn;
use crate::retrieval::GroundingRetriever;

/// Number of job postings retrieved to ground each reply.
pub const GROUNDING_TOP_K: usize = 3;

/// Upper bound on résumé characters folded into a chat message.
pub const MAX_RESUME_CHARS: usize = 4000;

pub struct ChatOrchestrator {
    retriever: GroundingRetriever,
    backend: Arc<BackendHandle>,
}

impl ChatOrchestrator {
    pub fn new(retriever: GroundingRetriever, backend: Arc<BackendHandle>) -> Self {
        Self { retriever, backend }
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// Answers `message` in the context of `history`.
    ///
    /// The backend is called exactly once; there is no retry or failover.
    pub async fn chat(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<String, AppError> {
        if message.is_empty() {
            return Err(AppError::Validation("message cannot be empty".to_string()));
        }

        let request_id = Uuid::new_v4();
        info!(
            %request_id,
            backend = self.backend.kind().as_str(),
            "New chat request: {} chars, {} history turns",
            message.chars().count(),
            history.len()
        );

        let grounding = self.retriever.retrieve(message, GROUNDING_TOP_K).await;
        if grounding.is_degraded() {
            warn!(
                %request_id,
                "Chat proceeding without job grounding: {:?}", grounding.failure
            );
        } else if grounding.is_empty() {
            info!(%request_id, "No matching jobs in the index");
        }

        let prompt = build_prompt(message, history, &grounding.snippets);
        info!(
            %request_id,
            "Assembled prompt: {} turns, {} grounding jobs",
            prompt.len(),
            grounding.snippets.len()
        );

        let reply = self.backend.send(&prompt).await.map_err(|e| {
            warn!(%request_id, "Chat generation failed: {e}");
            AppError::from(e)
        })?;

        info!(%request_id, "Chat reply generated: {} chars", reply.chars().count());
        Ok(reply)
    }
}

/// Prepends extracted résumé text to the user's message.
pub fn fold_resume(message: &str, resume_text: &str) -> String {
    let resume: String = resume_text.trim().chars().take(MAX_RESUME_CHARS).collect();
    format!("{RESUME_CONTEXT_HEADER}\n{resume}\n\n{message}")
}
