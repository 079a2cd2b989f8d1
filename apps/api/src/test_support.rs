//! Fixtures and in-memory fakes shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::extraction::{ExtractionError, TextExtractor};
use crate::llm_client::{LlmError, ModelProvider, StructuredResult};
use crate::models::{
    Candidate, CandidateUpdate, JobListing, JobPosting, ScoreOverview, ScoreSample, ScoreUpsert,
};
use crate::storage::{cv_storage_path, CvStore, MatchStore, StoreError};

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn job(title: &str) -> JobPosting {
    JobPosting {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: Some(format!("{title} description")),
        requirements: Some("3+ years".to_string()),
        required_skills: vec!["Rust".to_string()],
        status: "open".to_string(),
    }
}

pub fn candidate(full_name: &str, phone: Option<&str>) -> Candidate {
    let id = Uuid::new_v4();
    Candidate {
        id,
        full_name: full_name.to_string(),
        email: None,
        phone: phone.map(String::from),
        years_of_experience: None,
        education_level: None,
        cv_file_url: Some(format!(
            "https://demo.supabase.co/storage/v1/object/public/cv-files/{id}/cv.pdf"
        )),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Storage fakes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct StoreState {
    jobs: Vec<JobPosting>,
    candidates: Vec<Candidate>,
    scores: Vec<ScoreUpsert>,
    updates: Vec<(Uuid, CandidateUpdate)>,
}

/// [`MatchStore`] backed by vectors. Score rows are unique per
/// `(candidate_id, job_posting_id)`, mirroring the table constraint.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    failing_upserts: Mutex<HashSet<Uuid>>,
    failing_reads: AtomicBool,
}

impl InMemoryStore {
    pub fn new(jobs: Vec<JobPosting>, candidates: Vec<Candidate>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                jobs,
                candidates,
                ..Default::default()
            }),
            failing_upserts: Mutex::default(),
            failing_reads: AtomicBool::new(false),
        }
    }

    pub fn add_job(&self, job: JobPosting) {
        self.state.lock().unwrap().jobs.push(job);
    }

    /// Makes every upsert for `job_id` fail with a database error.
    pub fn fail_upserts_for(&self, job_id: Uuid) {
        self.failing_upserts.lock().unwrap().insert(job_id);
    }

    /// Makes the job listing queries fail with a database error.
    pub fn fail_reads(&self) {
        self.failing_reads.store(true, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn scores(&self) -> Vec<ScoreUpsert> {
        self.state.lock().unwrap().scores.clone()
    }

    pub fn scores_for(&self, candidate_id: Uuid) -> Vec<ScoreUpsert> {
        self.scores()
            .into_iter()
            .filter(|s| s.candidate_id == candidate_id)
            .collect()
    }

    pub fn candidate(&self, id: Uuid) -> Candidate {
        self.state
            .lock()
            .unwrap()
            .candidates
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .unwrap()
    }

    pub fn updates(&self) -> Vec<(Uuid, CandidateUpdate)> {
        self.state.lock().unwrap().updates.clone()
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn list_open_jobs(&self) -> Result<Vec<JobPosting>, StoreError> {
        self.check_reads()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .filter(|j| j.status == "open")
            .cloned()
            .collect())
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.state.lock().unwrap().candidates.clone())
    }

    async fn existing_score_job_ids(
        &self,
        candidate_id: Uuid,
    ) -> Result<HashSet<Uuid>, StoreError> {
        Ok(self
            .scores_for(candidate_id)
            .into_iter()
            .map(|s| s.job_posting_id)
            .collect())
    }

    async fn update_candidate(
        &self,
        candidate_id: Uuid,
        update: &CandidateUpdate,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(c) = state.candidates.iter_mut().find(|c| c.id == candidate_id) {
            update.apply_to(c);
        }
        state.updates.push((candidate_id, update.clone()));
        Ok(())
    }

    async fn upsert_score(&self, score: &ScoreUpsert) -> Result<(), StoreError> {
        if self
            .failing_upserts
            .lock()
            .unwrap()
            .contains(&score.job_posting_id)
        {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut state = self.state.lock().unwrap();
        match state.scores.iter_mut().find(|s| {
            s.candidate_id == score.candidate_id && s.job_posting_id == score.job_posting_id
        }) {
            Some(existing) => *existing = score.clone(),
            None => state.scores.push(score.clone()),
        }
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<JobListing>, StoreError> {
        self.check_reads()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .map(|j| JobListing {
                id: j.id,
                title: j.title.clone(),
                status: j.status.clone(),
                created_at: None,
            })
            .collect())
    }

    async fn score_overview(&self, sample_size: i64) -> Result<ScoreOverview, StoreError> {
        let scores = self.scores();
        Ok(ScoreOverview {
            total: scores.len() as i64,
            sample: scores
                .iter()
                .take(sample_size.max(0) as usize)
                .map(|s| ScoreSample {
                    job_posting_id: s.job_posting_id,
                    overall_score: s.overall_score,
                })
                .collect(),
        })
    }
}

/// CV bucket keyed by storage path.
#[derive(Default)]
pub struct InMemoryCvStore {
    files: Mutex<HashMap<String, Bytes>>,
}

impl InMemoryCvStore {
    /// Stores `text` as the CV of `candidate` under the path its URL points to.
    pub fn put_cv(&self, candidate: &Candidate, text: &str) {
        let url = candidate.cv_file_url.as_deref().unwrap();
        let path = cv_storage_path(url).unwrap().to_string();
        self.files
            .lock()
            .unwrap()
            .insert(path, Bytes::from(text.to_string()));
    }
}

#[async_trait]
impl CvStore for InMemoryCvStore {
    async fn download(&self, path: &str) -> Result<Bytes, StoreError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::ObjectStore(format!("object not found: {path}")))
    }
}

/// Treats the stored bytes as UTF-8 text.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Model fake
// ────────────────────────────────────────────────────────────────────────────

type Responder = Box<dyn Fn(&str) -> Result<StructuredResult, LlmError> + Send + Sync>;

/// Model provider driven by a closure over the prompt. Records every prompt.
pub struct ScriptedProvider {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(
        responder: impl Fn(&str) -> Result<StructuredResult, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::default(),
        }
    }

    /// Scores every job listed in the prompt with `overall_score` and
    /// extracts `extracted_info`. Prompts containing `FAIL_MODEL` fail.
    pub fn scoring(overall_score: i64, extracted_info: Value) -> Self {
        Self::new(move |prompt| {
            if prompt.contains("FAIL_MODEL") {
                return Err(LlmError::EmptyContent);
            }
            let evaluations: serde_json::Map<String, Value> = job_ids_in_prompt(prompt)
                .into_iter()
                .map(|id| {
                    (
                        id.to_string(),
                        json!({
                            "overall_score": overall_score,
                            "experience_score": overall_score,
                            "skills_score": overall_score,
                            "education_score": overall_score,
                            "location_score": overall_score,
                            "analysis": {"summary": "scripted"}
                        }),
                    )
                })
                .collect();
            match json!({"extracted_info": extracted_info, "evaluations": evaluations}) {
                Value::Object(map) => Ok(map),
                _ => unreachable!(),
            }
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn try_generate(&self, prompt: &str) -> Result<StructuredResult, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.responder)(prompt)
    }
}

/// Job ids listed in the `JOB ID:` lines of an evaluation prompt.
pub fn job_ids_in_prompt(prompt: &str) -> Vec<Uuid> {
    prompt
        .lines()
        .filter_map(|line| line.strip_prefix("JOB ID: "))
        .filter_map(|id| Uuid::parse_str(id.trim()).ok())
        .collect()
}
