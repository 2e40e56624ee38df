// Retrieval-augmented chat: prompt assembly, orchestration and the HTTP handlers.
// All model calls go through llm_client::BackendHandle.

pub mod assembler;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
