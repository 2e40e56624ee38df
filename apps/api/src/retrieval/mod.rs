//! Semantic job retrieval.
//!
//! `SemanticIndex` is the boundary to the external vector store; the store
//! embeds and ranks documents itself. `GroundingRetriever` wraps it for the
//! chat path and never fails: index errors and timeouts degrade to an empty
//! result carrying a diagnostic.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub mod chroma;
pub mod embeddings;
pub mod handlers;

use self::embeddings::EmbeddingError;

/// Retrieval gets a bounded wait; on expiry the chat proceeds ungrounded.
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Vector store unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Vector store error (status {status}): {message}")]
    Store { status: u16, message: String },

    #[error("Unexpected vector store response: {0}")]
    Malformed(String),

    #[error("Failed to embed text: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// One ranked match returned by the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexHit {
    pub id: String,
    pub document: String,
    /// Non-negative; smaller means more similar.
    pub distance: f32,
}

/// Opaque nearest-neighbour text store.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    async fn add(&self, id: &str, document: &str) -> Result<(), IndexError>;

    /// Returns at most `top_k` hits in descending relevance.
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<IndexHit>, IndexError>;

    async fn exists(&self, id: &str) -> Result<bool, IndexError>;

    async fn all_ids(&self) -> Result<HashSet<String>, IndexError>;
}

/// Maps an index distance to a display relevance in [0, 1], rounded to three
/// decimals.
pub fn relevance_score(distance: f32) -> f32 {
    let relevance = (1.0 - distance / 2.0).max(0.0);
    (relevance * 1000.0).round() / 1000.0
}

/// Why grounding came back empty when it was not the index's own answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalFailure {
    Index(String),
    TimedOut(Duration),
}

/// Job descriptions retrieved for one request, most relevant first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundingResult {
    pub snippets: Vec<String>,
    /// Set when the index failed and the result was emptied.
    pub failure: Option<RetrievalFailure>,
}

impl GroundingResult {
    pub fn found(snippets: Vec<String>) -> Self {
        Self {
            snippets,
            failure: None,
        }
    }

    fn degraded(failure: RetrievalFailure) -> Self {
        Self {
            snippets: Vec::new(),
            failure: Some(failure),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

#[derive(Clone)]
pub struct GroundingRetriever {
    index: Arc<dyn SemanticIndex>,
    timeout: Duration,
}

impl GroundingRetriever {
    pub fn new(index: Arc<dyn SemanticIndex>) -> Self {
        Self::with_timeout(index, DEFAULT_RETRIEVAL_TIMEOUT)
    }

    pub fn with_timeout(index: Arc<dyn SemanticIndex>, timeout: Duration) -> Self {
        Self { index, timeout }
    }

    /// Returns the `top_k` stored job descriptions most similar to `query`.
    ///
    /// The query is passed to the index as-is, even when blank. Ranking is
    /// the index's own; nothing is re-ordered here. Hits with blank document
    /// text are skipped so they never count as grounding.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> GroundingResult {
        match tokio::time::timeout(self.timeout, self.index.query(query, top_k)).await {
            Ok(Ok(hits)) => {
                debug!("Retrieved {} grounding snippets", hits.len());
                GroundingResult::found(
                    hits.into_iter()
                        .filter(|hit| !hit.document.trim().is_empty())
                        .take(top_k)
                        .map(|hit| hit.document)
                        .collect(),
                )
            }
            Ok(Err(e)) => {
                warn!("Job retrieval failed, continuing without grounding: {e}");
                GroundingResult::degraded(RetrievalFailure::Index(e.to_string()))
            }
            Err(_) => {
                warn!(
                    "Job retrieval timed out after {}s, continuing without grounding",
                    self.timeout.as_secs()
                );
                GroundingResult::degraded(RetrievalFailure::TimedOut(self.timeout))
            }
        }
    }
}
