//! Axum route handlers for the Vector API.
//!
//! The external job-management system registers new postings here.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddJobRequest {
    pub job_id: String,
    pub title: String,
    pub description: String,
}

impl AddJobRequest {
    /// Text stored in the index for this posting.
    pub fn document(&self) -> String {
        format!("{}: {}", self.title, self.description)
    }
}

#[derive(Debug, Serialize)]
pub struct AddJobResponse {
    pub success: bool,
    pub message: String,
    pub job_id: String,
    /// False when the job was already indexed and nothing was written.
    pub created: bool,
}

#[derive(Debug, Serialize)]
pub struct JobExistsResponse {
    pub job_id: String,
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct IndexStatsResponse {
    pub total_jobs: usize,
}

/// POST /api/vector/add-job
pub async fn handle_add_job(
    State(state): State<AppState>,
    Json(request): Json<AddJobRequest>,
) -> Result<Json<AddJobResponse>, AppError> {
    let job_id = request.job_id.trim().to_string();
    if job_id.is_empty() {
        return Err(AppError::Validation("job_id cannot be empty".to_string()));
    }

    if state.index.exists(&job_id).await? {
        info!("Job {job_id} already indexed, skipping");
        return Ok(Json(AddJobResponse {
            success: true,
            message: format!("Job {job_id} is already in the vector index"),
            job_id,
            created: false,
        }));
    }

    state.index.add(&job_id, &request.document()).await?;
    info!("Indexed job {job_id}");

    Ok(Json(AddJobResponse {
        success: true,
        message: format!("Added job {job_id} to the vector index"),
        job_id,
        created: true,
    }))
}

/// GET /api/vector/jobs/:job_id
pub async fn handle_job_exists(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobExistsResponse>, AppError> {
    let exists = state.index.exists(&job_id).await?;
    Ok(Json(JobExistsResponse { job_id, exists }))
}

/// GET /api/vector/stats
pub async fn handle_index_stats(
    State(state): State<AppState>,
) -> Result<Json<IndexStatsResponse>, AppError> {
    let ids = state.index.all_ids().await?;
    Ok(Json(IndexStatsResponse {
        total_jobs: ids.len(),
    }))
}
