// Résumé ingestion: PDF text extraction, profile fields, and the job search
// query derived from them. Consumed by the CV endpoints and résumé-aware chat.

pub mod extract;
pub mod handlers;
pub mod search_query;
pub mod upload;

use bytes::Bytes;

use crate::models::resume::ResumeAnalysis;
use crate::resume::extract::{analyze_pdf, extract_text, ExtractionError};

/// Single-page text PDF used by résumé tests across the crate.
#[cfg(test)]
pub(crate) const SAMPLE_CV_PDF: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/sample_cv.pdf"));

/// Runs full résumé analysis off the async executor.
pub async fn analyze_document(pdf: Bytes) -> Result<ResumeAnalysis, ExtractionError> {
    tokio::task::spawn_blocking(move || analyze_pdf(&pdf))
        .await
        .map_err(|e| ExtractionError::Unreadable(format!("extraction task failed: {e}")))?
}

/// Extracts only the document text, off the async executor.
pub async fn document_text(pdf: Bytes) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text(&pdf))
        .await
        .map_err(|e| ExtractionError::Unreadable(format!("extraction task failed: {e}")))?
}
