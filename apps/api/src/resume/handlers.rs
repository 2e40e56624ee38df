//! Axum route handlers for the CV API.

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::resume::ResumeProfile;
use crate::resume::analyze_document;
use crate::resume::search_query::search_query_or_fallback;
use crate::resume::upload::UploadForm;
use crate::retrieval::relevance_score;
use crate::state::AppState;

const DEFAULT_TOP_K: usize = 10;
const MAX_TOP_K: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CvAnalysisResponse {
    pub success: bool,
    #[serde(flatten)]
    pub profile: Option<ResumeProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct JobRecommendation {
    pub job_id: String,
    pub description: String,
    pub relevance_score: f32,
}

#[derive(Debug, Serialize)]
pub struct JobRecommendationResponse {
    pub success: bool,
    pub jobs: Vec<JobRecommendation>,
    pub total: usize,
    pub cv_summary: ResumeProfile,
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/cv/upload
///
/// Extracts profile fields from an uploaded PDF. Unreadable documents are a
/// `success: false` response rather than an HTTP error.
pub async fn handle_upload_cv(multipart: Multipart) -> Result<Json<CvAnalysisResponse>, AppError> {
    let file = UploadForm::read(multipart).await?.require_pdf()?;
    info!("Analyzing CV '{}' ({} bytes)", file.file_name, file.bytes.len());

    let response = match analyze_document(file.bytes).await {
        Ok(analysis) => CvAnalysisResponse {
            success: true,
            profile: Some(analysis.profile),
            message: Some("CV analyzed successfully".to_string()),
            error: None,
        },
        Err(e) => {
            warn!("CV analysis failed: {e}");
            CvAnalysisResponse {
                success: false,
                profile: None,
                message: None,
                error: Some(e.to_string()),
            }
        }
    };

    Ok(Json(response))
}

/// POST /api/cv/recommend-jobs?top_k=N
///
/// Ranks indexed job postings against an uploaded CV. Queries the index
/// directly, so index failures are reported rather than hidden.
pub async fn handle_recommend_jobs(
    State(state): State<AppState>,
    Query(params): Query<RecommendQuery>,
    multipart: Multipart,
) -> Result<Json<JobRecommendationResponse>, AppError> {
    let top_k = params.top_k.unwrap_or(DEFAULT_TOP_K);
    if !(1..=MAX_TOP_K).contains(&top_k) {
        return Err(AppError::Validation(format!(
            "top_k must be between 1 and {MAX_TOP_K}"
        )));
    }

    let file = UploadForm::read(multipart).await?.require_pdf()?;
    let analysis = analyze_document(file.bytes)
        .await
        .map_err(|e| AppError::Validation(format!("Could not analyze CV: {e}")))?;

    let query = search_query_or_fallback(&analysis.profile, &analysis.full_text);
    debug!("CV search query built: {} chars", query.chars().count());

    let hits = state.index.query(&query, top_k).await?;
    let jobs: Vec<JobRecommendation> = hits
        .into_iter()
        .map(|hit| JobRecommendation {
            relevance_score: relevance_score(hit.distance),
            job_id: hit.id,
            description: hit.document,
        })
        .collect();

    let total = jobs.len();
    Ok(Json(JobRecommendationResponse {
        success: true,
        jobs,
        total,
        cv_summary: analysis.profile,
        message: format!("Found {total} jobs matching your CV"),
    }))
}

/// GET /api/cv/test
pub async fn handle_cv_test() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "CV service is ready",
        "endpoints": {
            "upload": "/api/cv/upload - upload and analyze a CV",
            "recommend": "/api/cv/recommend-jobs - upload a CV and get matching jobs"
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_analysis_shape() {
        let response = CvAnalysisResponse {
            success: false,
            profile: None,
            message: None,
            error: Some("CV is too short or its content could not be read".to_string()),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("skills").is_none());
        assert!(json.get("message").is_none());
        assert!(json["error"].as_str().unwrap().contains("too short"));
    }

    #[test]
    fn test_successful_analysis_flattens_profile() {
        let response = CvAnalysisResponse {
            success: true,
            profile: Some(ResumeProfile {
                email: Some("a@b.vn".to_string()),
                phone: None,
                skills: vec!["Python".to_string()],
                experience_years: Some(3),
            }),
            message: Some("CV analyzed successfully".to_string()),
            error: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "a@b.vn");
        assert_eq!(json["skills"][0], "Python");
        assert_eq!(json["experience_years"], 3);
        assert!(json.get("error").is_none());
    }
}
