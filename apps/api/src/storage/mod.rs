//! Storage contracts for a matching run.
//!
//! [`MatchStore`] covers the relational side (jobs, candidates, scores) and
//! [`CvStore`] the CV file bucket. Production uses [`postgres::PgMatchStore`]
//! and [`s3::S3CvStore`]; tests swap in in-memory fakes.

use std::collections::HashSet;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Candidate, CandidateUpdate, JobListing, JobPosting, ScoreOverview, ScoreUpsert,
};

pub mod postgres;
pub mod s3;

/// Public CV URLs look like `.../storage/v1/object/public/cv-files/<user>/<file>.pdf`.
pub const CV_PATH_MARKER: &str = "/cv-files/";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Object store error: {0}")]
    ObjectStore(String),
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Job postings whose status is `open`, in a stable order.
    async fn list_open_jobs(&self) -> Result<Vec<JobPosting>, StoreError>;

    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError>;

    /// Job ids that already have a score row for this candidate.
    async fn existing_score_job_ids(&self, candidate_id: Uuid)
        -> Result<HashSet<Uuid>, StoreError>;

    /// Partial update: fields left as `None` keep their stored value.
    async fn update_candidate(
        &self,
        candidate_id: Uuid,
        update: &CandidateUpdate,
    ) -> Result<(), StoreError>;

    /// Insert or replace the row keyed by `(candidate_id, job_posting_id)`.
    async fn upsert_score(&self, score: &ScoreUpsert) -> Result<(), StoreError>;

    /// Every job posting regardless of status.
    async fn list_jobs(&self) -> Result<Vec<JobListing>, StoreError>;

    async fn score_overview(&self, sample_size: i64) -> Result<ScoreOverview, StoreError>;
}

#[async_trait]
pub trait CvStore: Send + Sync {
    /// Raw bytes of the CV stored at `path` inside the CV bucket.
    async fn download(&self, path: &str) -> Result<Bytes, StoreError>;
}

/// Derives the bucket path from a CV URL: everything after the last
/// `/cv-files/`. Returns `None` when the marker is missing or nothing follows it.
pub fn cv_storage_path(url: &str) -> Option<&str> {
    let (_, path) = url.rsplit_once(CV_PATH_MARKER)?;
    let path = path.trim();
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}
