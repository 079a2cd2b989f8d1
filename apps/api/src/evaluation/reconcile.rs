//! Result Reconciler — turns one model answer into a candidate update and a
//! list of score upserts.
//!
//! Rules:
//! - extracted fields only enter the update when present and non-empty, so a
//!   `null` from the model never clears stored data;
//! - `years_of_experience` goes through a float-then-int cast, unparsable or
//!   out-of-range values are dropped;
//! - an evaluation keyed by a job id that was not in the batch is dropped with
//!   a warning, its siblings are still used;
//! - missing scores default to 0, missing `analysis` to `{}`.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::llm_client::StructuredResult;
use crate::models::{Candidate, CandidateUpdate, JobPosting, ScoreUpsert};

const SCORE_FIELDS: [&str; 5] = [
    "overall_score",
    "experience_score",
    "skills_score",
    "education_score",
    "location_score",
];

#[derive(Debug, Default)]
pub struct Reconciliation {
    pub candidate_update: CandidateUpdate,
    /// In the order the model listed the evaluations.
    pub score_upserts: Vec<ScoreUpsert>,
    /// Evaluation keys that were dropped (unrequested job or malformed entry).
    pub rejected_job_ids: Vec<String>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.candidate_update.is_empty() && self.score_upserts.is_empty()
    }
}

pub fn reconcile(
    candidate: &Candidate,
    jobs_to_evaluate: &[&JobPosting],
    result: &StructuredResult,
) -> Reconciliation {
    if result.is_empty() {
        return Reconciliation::default();
    }

    let candidate_update = result
        .get("extracted_info")
        .and_then(Value::as_object)
        .map(extract_candidate_update)
        .unwrap_or_default();

    let requested: HashSet<Uuid> = jobs_to_evaluate.iter().map(|j| j.id).collect();
    let mut score_upserts = Vec::new();
    let mut rejected_job_ids = Vec::new();

    let evaluations = result.get("evaluations").and_then(Value::as_object);
    for (key, evaluation) in evaluations.into_iter().flatten() {
        let job_id = match Uuid::parse_str(key.trim()) {
            Ok(id) if requested.contains(&id) => id,
            _ => {
                warn!(
                    candidate_id = %candidate.id,
                    job_id = %key,
                    "LLM returned evaluation for unknown/unrequested job, skipping"
                );
                rejected_job_ids.push(key.clone());
                continue;
            }
        };

        let Some(evaluation) = evaluation.as_object() else {
            warn!(
                candidate_id = %candidate.id,
                %job_id,
                "Evaluation is not a JSON object, skipping"
            );
            rejected_job_ids.push(key.clone());
            continue;
        };

        score_upserts.push(build_score(candidate.id, job_id, evaluation));
    }

    Reconciliation {
        candidate_update,
        score_upserts,
        rejected_job_ids,
    }
}

fn extract_candidate_update(info: &Map<String, Value>) -> CandidateUpdate {
    CandidateUpdate {
        full_name: text_field(info, "full_name"),
        email: text_field(info, "email"),
        phone: text_field(info, "phone"),
        years_of_experience: info
            .get("years_of_experience")
            .and_then(coerce_number)
            .and_then(whole_years),
        education_level: text_field(info, "education_level"),
    }
}

fn build_score(candidate_id: Uuid, job_posting_id: Uuid, evaluation: &Map<String, Value>) -> ScoreUpsert {
    let [overall, experience, skills, education, location] =
        SCORE_FIELDS.map(|field| score_field(evaluation, field));

    ScoreUpsert {
        candidate_id,
        job_posting_id,
        overall_score: overall,
        experience_score: experience,
        skills_score: skills,
        education_score: education,
        location_score: location,
        score_details: evaluation
            .get("analysis")
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())),
    }
}

/// Non-empty text. Phone numbers sometimes come back as JSON numbers.
fn text_field(info: &Map<String, Value>, key: &str) -> Option<String> {
    match info.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts JSON numbers and numeric strings ("3", "3.0", " 7.5 ").
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Truncated to whole years; values that do not fit the column are dropped.
fn whole_years(years: f64) -> Option<i32> {
    let years = years.trunc();
    (years >= f64::from(i32::MIN) && years <= f64::from(i32::MAX)).then_some(years as i32)
}

/// Integer score in [0, 100]; absent or non-numeric is 0.
fn score_field(evaluation: &Map<String, Value>, key: &str) -> i32 {
    evaluation
        .get(key)
        .and_then(coerce_number)
        .map(|n| n.clamp(0.0, 100.0) as i32)
        .unwrap_or(0)
}
