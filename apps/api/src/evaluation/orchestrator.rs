//! Evaluation run — sequences one matching pass over every candidate.
//!
//! Flow per run: open jobs → candidates → for each candidate:
//!       download CV → extract text → select work → build prompt →
//!       model call → reconcile → persist.
//!
//! Candidates are processed one at a time with one model call each. Any
//! failure inside a candidate's pass is logged and the loop moves on; only the
//! initial job/candidate fetches can fail the run as a whole. A candidate that
//! failed keeps no new scores and is picked up again by the next run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::evaluation::prompts::build_evaluation_prompt;
use crate::evaluation::reconcile::{reconcile, Reconciliation};
use crate::evaluation::selector::select_work;
use crate::extraction::{ExtractionError, TextExtractor};
use crate::llm_client::ModelProvider;
use crate::models::{Candidate, JobPosting};
use crate::storage::{cv_storage_path, CvStore, MatchStore, StoreError};

// ────────────────────────────────────────────────────────────────────────────
// Outcomes
// ────────────────────────────────────────────────────────────────────────────

/// Why a candidate's pass was abandoned. None of these stop the run.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("no CV file URL on record")]
    MissingCvUrl,

    #[error("CV URL '{0}' has no '/cv-files/' segment")]
    InvalidCvUrl(String),

    #[error("CV download failed: {0}")]
    Download(#[source] StoreError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("no text could be extracted from the CV")]
    EmptyText,

    #[error("could not load existing scores: {0}")]
    ExistingScores(#[source] StoreError),

    #[error("model returned no usable result")]
    EmptyModelResult,
}

enum CandidateOutcome {
    /// Every open job is scored and the profile is complete.
    UpToDate,
    Evaluated(PersistReport),
}

#[derive(Debug, Default)]
struct PersistReport {
    candidate_updated: bool,
    scores_written: usize,
    scores_failed: usize,
    rejected: usize,
}

/// Counters for one run, returned to the trigger endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub open_jobs: usize,
    pub candidates: usize,
    /// Candidates whose batch reached the model and came back usable.
    pub evaluated: usize,
    pub up_to_date: usize,
    pub failed: usize,
    pub candidates_updated: usize,
    pub scores_written: usize,
    pub scores_failed: usize,
    pub evaluations_rejected: usize,
}

impl RunSummary {
    fn record(&mut self, report: &PersistReport) {
        self.evaluated += 1;
        if report.candidate_updated {
            self.candidates_updated += 1;
        }
        self.scores_written += report.scores_written;
        self.scores_failed += report.scores_failed;
        self.evaluations_rejected += report.rejected;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Runner
// ────────────────────────────────────────────────────────────────────────────

/// Owns the collaborators of a run. Built once at startup.
pub struct EvaluationRunner {
    store: Arc<dyn MatchStore>,
    cv_store: Arc<dyn CvStore>,
    extractor: Arc<dyn TextExtractor>,
    provider: Arc<dyn ModelProvider>,
}

impl EvaluationRunner {
    pub fn new(
        store: Arc<dyn MatchStore>,
        cv_store: Arc<dyn CvStore>,
        extractor: Arc<dyn TextExtractor>,
        provider: Arc<dyn ModelProvider>,
    ) -> Self {
        Self {
            store,
            cv_store,
            extractor,
            provider,
        }
    }

    /// Runs one full pass. Jobs and candidates are read once up front.
    pub async fn run(&self) -> Result<RunSummary, StoreError> {
        info!("Fetching open job postings...");
        let jobs = self.store.list_open_jobs().await?;
        let mut summary = RunSummary {
            open_jobs: jobs.len(),
            ..Default::default()
        };
        if jobs.is_empty() {
            info!("No open job postings found.");
            return Ok(summary);
        }
        info!("Found {} open jobs.", jobs.len());

        let candidates = self.store.list_candidates().await?;
        summary.candidates = candidates.len();
        if candidates.is_empty() {
            info!("No candidates found.");
            return Ok(summary);
        }
        info!("Found {} candidates.", candidates.len());

        for candidate in &candidates {
            info!(
                candidate_id = %candidate.id,
                name = %candidate.full_name,
                "Processing candidate"
            );

            match self.process_candidate(candidate, &jobs).await {
                Ok(CandidateOutcome::UpToDate) => {
                    info!(
                        candidate_id = %candidate.id,
                        "All jobs scored and info complete, skipping"
                    );
                    summary.up_to_date += 1;
                }
                Ok(CandidateOutcome::Evaluated(report)) => summary.record(&report),
                Err(e) => {
                    warn!(
                        candidate_id = %candidate.id,
                        name = %candidate.full_name,
                        error = %e,
                        "Skipping candidate"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            evaluated = summary.evaluated,
            up_to_date = summary.up_to_date,
            failed = summary.failed,
            scores_written = summary.scores_written,
            "Evaluation run finished"
        );
        Ok(summary)
    }

    async fn process_candidate(
        &self,
        candidate: &Candidate,
        jobs: &[JobPosting],
    ) -> Result<CandidateOutcome, CandidateError> {
        let cv_text = self.load_cv_text(candidate).await?;

        let existing = self
            .store
            .existing_score_job_ids(candidate.id)
            .await
            .map_err(CandidateError::ExistingScores)?;

        let selection = select_work(candidate, jobs, &existing);
        if selection.is_empty() {
            return Ok(CandidateOutcome::UpToDate);
        }
        info!(
            candidate_id = %candidate.id,
            full_reeval = selection.force_full_reeval,
            "Evaluating against {} jobs...",
            selection.jobs.len()
        );

        let prompt = build_evaluation_prompt(&cv_text, &selection.jobs);
        let result = self.provider.generate(&prompt).await;
        if result.is_empty() {
            return Err(CandidateError::EmptyModelResult);
        }

        let reconciliation = reconcile(candidate, &selection.jobs, &result);
        if reconciliation.is_empty() {
            warn!(
                candidate_id = %candidate.id,
                "Model answer had no extracted info and no usable evaluations"
            );
        }
        Ok(CandidateOutcome::Evaluated(
            self.persist(candidate, reconciliation).await,
        ))
    }

    async fn load_cv_text(&self, candidate: &Candidate) -> Result<String, CandidateError> {
        let url = candidate
            .cv_file_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(CandidateError::MissingCvUrl)?;
        let path =
            cv_storage_path(url).ok_or_else(|| CandidateError::InvalidCvUrl(url.to_string()))?;

        debug!(candidate_id = %candidate.id, path, "Downloading CV");
        let bytes = self
            .cv_store
            .download(path)
            .await
            .map_err(CandidateError::Download)?;

        // PDF parsing is CPU-bound; keep it off the async workers.
        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))??;
        if text.trim().is_empty() {
            return Err(CandidateError::EmptyText);
        }
        Ok(text)
    }

    /// Writes the candidate update, then every score. A failed write is
    /// logged and counted; the remaining writes still run.
    async fn persist(&self, candidate: &Candidate, reconciliation: Reconciliation) -> PersistReport {
        let mut report = PersistReport {
            rejected: reconciliation.rejected_job_ids.len(),
            ..Default::default()
        };

        let update = &reconciliation.candidate_update;
        if !update.is_empty() {
            match self.store.update_candidate(candidate.id, update).await {
                Ok(()) => {
                    info!(
                        candidate_id = %candidate.id,
                        fields = ?update.changed_fields(),
                        "Candidate info updated"
                    );
                    report.candidate_updated = true;
                }
                Err(e) => warn!(
                    candidate_id = %candidate.id,
                    error = %e,
                    "Failed to update candidate info"
                ),
            }
        }

        for score in &reconciliation.score_upserts {
            match self.store.upsert_score(score).await {
                Ok(()) => {
                    info!(
                        candidate_id = %candidate.id,
                        job_id = %score.job_posting_id,
                        overall_score = score.overall_score,
                        "Score saved"
                    );
                    report.scores_written += 1;
                }
                Err(e) => {
                    warn!(
                        candidate_id = %candidate.id,
                        job_id = %score.job_posting_id,
                        error = %e,
                        "Failed to save score"
                    );
                    report.scores_failed += 1;
                }
            }
        }

        report
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
