use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::ProviderSettings;

const DEFAULT_PROVIDER: &str = "google";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:8080,http://127.0.0.1:8080";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub cv_bucket: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub llm: ProviderSettings,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let request_delay_ms: u64 = parse_env("LLM_REQUEST_DELAY_MS", 2000)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            cv_bucket: optional_env("CV_BUCKET").unwrap_or_else(|| "cv-files".to_string()),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            llm: ProviderSettings {
                provider: optional_env("LLM_PROVIDER")
                    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
                model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                google_api_key: optional_env("GOOGLE_API_KEY"),
                openai_api_key: optional_env("OPENAI_API_KEY"),
                ollama_host: optional_env("OLLAMA_HOST")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string()),
                request_delay: Duration::from_millis(request_delay_ms),
                max_retries: parse_env("LLM_MAX_RETRIES", 3)?,
            },
            cors_origins: split_origins(
                &optional_env("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
