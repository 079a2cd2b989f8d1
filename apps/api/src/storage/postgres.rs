use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{MatchStore, StoreError};
use crate::models::{
    Candidate, CandidateUpdate, JobListing, JobPosting, ScoreOverview, ScoreSample, ScoreUpsert,
};

/// [`MatchStore`] over the `job_postings`, `candidates` and `candidate_scores` tables.
#[derive(Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn list_open_jobs(&self) -> Result<Vec<JobPosting>, StoreError> {
        Ok(sqlx::query_as::<_, JobPosting>(
            r#"
            SELECT id, title, description, requirements,
                   COALESCE(required_skills, '{}') AS required_skills, status
            FROM job_postings
            WHERE status = 'open'
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        Ok(sqlx::query_as::<_, Candidate>(
            r#"
            SELECT id, COALESCE(full_name, '') AS full_name, email, phone,
                   years_of_experience, education_level, cv_file_url
            FROM candidates
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn existing_score_job_ids(
        &self,
        candidate_id: Uuid,
    ) -> Result<HashSet<Uuid>, StoreError> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT job_posting_id FROM candidate_scores WHERE candidate_id = $1")
                .bind(candidate_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().collect())
    }

    async fn update_candidate(
        &self,
        candidate_id: Uuid,
        update: &CandidateUpdate,
    ) -> Result<(), StoreError> {
        if update.is_empty() {
            return Ok(());
        }

        // COALESCE keeps the stored value for every field the update leaves out.
        sqlx::query(
            r#"
            UPDATE candidates SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                years_of_experience = COALESCE($5, years_of_experience),
                education_level = COALESCE($6, education_level)
            WHERE id = $1
            "#,
        )
        .bind(candidate_id)
        .bind(&update.full_name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(update.years_of_experience)
        .bind(&update.education_level)
        .execute(&self.pool)
        .await?;

        debug!(%candidate_id, fields = ?update.changed_fields(), "Candidate updated");
        Ok(())
    }

    async fn upsert_score(&self, score: &ScoreUpsert) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO candidate_scores
                (candidate_id, job_posting_id, overall_score, experience_score,
                 skills_score, education_score, location_score, score_details)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (candidate_id, job_posting_id) DO UPDATE SET
                overall_score = EXCLUDED.overall_score,
                experience_score = EXCLUDED.experience_score,
                skills_score = EXCLUDED.skills_score,
                education_score = EXCLUDED.education_score,
                location_score = EXCLUDED.location_score,
                score_details = EXCLUDED.score_details,
                updated_at = now()
            "#,
        )
        .bind(score.candidate_id)
        .bind(score.job_posting_id)
        .bind(score.overall_score)
        .bind(score.experience_score)
        .bind(score.skills_score)
        .bind(score.education_score)
        .bind(score.location_score)
        .bind(&score.score_details)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<JobListing>, StoreError> {
        Ok(sqlx::query_as::<_, JobListing>(
            "SELECT id, title, status, created_at FROM job_postings ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn score_overview(&self, sample_size: i64) -> Result<ScoreOverview, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidate_scores")
            .fetch_one(&self.pool)
            .await?;
        let sample = sqlx::query_as::<_, ScoreSample>(
            "SELECT job_posting_id, overall_score FROM candidate_scores ORDER BY created_at LIMIT $1",
        )
        .bind(sample_size)
        .fetch_all(&self.pool)
        .await?;
        Ok(ScoreOverview { total, sample })
    }
}
