pub mod candidate;
pub mod job;
pub mod score;

pub use candidate::{Candidate, CandidateUpdate};
pub use job::{JobListing, JobPosting};
pub use score::{ScoreOverview, ScoreSample, ScoreUpsert};
