//! Axum route handlers for triggering runs and inspecting results.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::evaluation::orchestrator::RunSummary;
use crate::models::{JobListing, ScoreOverview};
use crate::state::AppState;

/// Rows returned by the scores diagnostic endpoint.
const SCORE_SAMPLE_SIZE: i64 = 5;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisRequest {
    /// Accepted for API compatibility; every run covers all open jobs.
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: String,
    pub message: String,
    pub summary: RunSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobsResponse {
    pub total: usize,
    pub jobs: Vec<JobListing>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /analyze
///
/// Runs a full evaluation pass and waits for it to finish. Concurrent
/// triggers queue behind the run lock instead of interleaving writes.
pub async fn handle_analyze(
    State(state): State<AppState>,
    request: Option<Json<AnalysisRequest>>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let Json(request) = request.unwrap_or_default();
    if let Some(job_id) = &request.job_id {
        info!(%job_id, "Analysis requested for job; running full pass");
    }

    let _guard = state.run_lock.lock().await;
    let summary = state.runner.run().await?;

    Ok(Json(AnalysisResponse {
        status: "success".to_string(),
        message: "Analysis completed successfully".to_string(),
        summary,
    }))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(State(state): State<AppState>) -> Result<Json<JobsResponse>, AppError> {
    let jobs = state.store.list_jobs().await?;
    Ok(Json(JobsResponse {
        total: jobs.len(),
        jobs,
    }))
}

/// GET /api/v1/scores
pub async fn handle_score_overview(
    State(state): State<AppState>,
) -> Result<Json<ScoreOverview>, AppError> {
    Ok(Json(state.store.score_overview(SCORE_SAMPLE_SIZE).await?))
}
