// Evaluation prompt: one request per candidate covering every selected job
// plus the candidate field extraction. The JSON schema below is the contract
// the reconciler parses; keep both in step.

use crate::models::JobPosting;

/// Upper bound on CV characters embedded in a prompt.
pub const MAX_CV_CHARS: usize = 15_000;

/// Replace `{jobs_section}` and `{cv_text}` before sending.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"
You are an expert HR recruiter. Evaluate the following candidate CV against the provided Job Descriptions.

JOBS TO EVALUATE:
{jobs_section}

CANDIDATE CV:
{cv_text}

Analyze the match for EACH job.

Also, extract the following information from the CV (once):
- Candidate Name (Full Name)
- Email
- Phone Number
- Years of Experience (as a number)
- Education Level (e.g., Bachelor, Master, PhD, High School)

Output strictly in JSON format with the following structure:
{
    "extracted_info": {
        "full_name": "<string or null>",
        "email": "<email or null>",
        "phone": "<string or null>",
        "years_of_experience": <number or null>,
        "education_level": "<string or null>"
    },
    "evaluations": {
        "<job_id>": {
            "overall_score": <number 0-100>,
            "experience_score": <number 0-100>,
            "skills_score": <number 0-100>,
            "education_score": <number 0-100>,
            "location_score": <number 0-100>,
            "analysis": {
                "summary": "<Concise professional summary>",
                "green_flags": ["<flag1>", "<flag2>"],
                "red_flags": ["<flag1>", "<flag2>"],
                "experience_analysis": "<Concise analysis>",
                "education_analysis": "<Concise analysis>",
                "skills_analysis": "<Concise analysis>",
                "match_reasoning": "<Why good/bad fit>"
            }
        }
    }
}
"#;

/// Renders the labeled block for one job.
pub fn render_job_block(job: &JobPosting) -> String {
    format!(
        "\nJOB ID: {}\nTitle: {}\nDescription: {}\nRequirements: {}\nRequired Skills: {}\n---\n",
        job.id,
        job.title,
        job.description.as_deref().unwrap_or_default(),
        job.requirements.as_deref().unwrap_or_default(),
        job.required_skills.join(", ")
    )
}

/// First `MAX_CV_CHARS` characters of the CV. Cuts mid-word.
pub fn truncate_cv(cv_text: &str) -> &str {
    match cv_text.char_indices().nth(MAX_CV_CHARS) {
        Some((byte_idx, _)) => &cv_text[..byte_idx],
        None => cv_text,
    }
}

pub fn build_evaluation_prompt(cv_text: &str, jobs: &[&JobPosting]) -> String {
    let jobs_section: String = jobs.iter().map(|job| render_job_block(job)).collect();

    // CV text goes in last so placeholder-looking text inside a CV is never expanded.
    EVALUATION_PROMPT_TEMPLATE
        .replace("{jobs_section}", &jobs_section)
        .replace("{cv_text}", truncate_cv(cv_text))
}
