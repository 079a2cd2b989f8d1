//! Work Selector — decides which open jobs a candidate still needs scores for.
//!
//! Incremental by default: jobs that already have a score row are skipped.
//! A candidate whose profile still carries upload placeholders (file-name as
//! name, no phone) is re-evaluated against every open job so the extraction
//! half of the prompt runs again.

use std::collections::HashSet;

use uuid::Uuid;

use crate::models::{Candidate, JobPosting};

/// Literal names the upload form leaves behind when it could not read one.
const PLACEHOLDER_NAMES: &[&str] = &["cv con foto"];

#[derive(Debug)]
pub struct WorkSelection<'a> {
    pub jobs: Vec<&'a JobPosting>,
    /// True when the candidate is re-evaluated against every open job.
    pub force_full_reeval: bool,
}

impl WorkSelection<'_> {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// True when `name` is really a file name or an upload placeholder.
pub fn looks_like_filename_placeholder(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    lower.starts_with("cv ")
        || lower.ends_with(".pdf")
        || PLACEHOLDER_NAMES.contains(&lower.as_str())
}

/// True when the candidate record is missing data that extraction should fill.
pub fn needs_profile_update(candidate: &Candidate) -> bool {
    let phone_missing = candidate
        .phone
        .as_deref()
        .map_or(true, |p| p.trim().is_empty());
    looks_like_filename_placeholder(&candidate.full_name) || phone_missing
}

pub fn select_work<'a>(
    candidate: &Candidate,
    open_jobs: &'a [JobPosting],
    existing_score_job_ids: &HashSet<Uuid>,
) -> WorkSelection<'a> {
    if needs_profile_update(candidate) {
        return WorkSelection {
            jobs: open_jobs.iter().collect(),
            force_full_reeval: true,
        };
    }

    WorkSelection {
        jobs: open_jobs
            .iter()
            .filter(|job| !existing_score_job_ids.contains(&job.id))
            .collect(),
        force_full_reeval: false,
    }
}
