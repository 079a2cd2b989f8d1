use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A job posting snapshot. Only postings with `status = "open"` take part in a run.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub required_skills: Vec<String>,
    pub status: String,
}

/// Lightweight listing row for the jobs diagnostic endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobListing {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}
