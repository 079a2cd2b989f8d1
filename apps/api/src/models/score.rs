use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One `candidate_scores` row to insert or replace, keyed by
/// `(candidate_id, job_posting_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreUpsert {
    pub candidate_id: Uuid,
    pub job_posting_id: Uuid,
    pub overall_score: i32,
    pub experience_score: i32,
    pub skills_score: i32,
    pub education_score: i32,
    pub location_score: i32,
    /// Summary, green/red flags, sub-analyses and reasoning as returned by the model.
    pub score_details: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoreSample {
    pub job_posting_id: Uuid,
    pub overall_score: i32,
}

/// Row count plus a handful of rows, for the scores diagnostic endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOverview {
    pub total: i64,
    pub sample: Vec<ScoreSample>,
}
