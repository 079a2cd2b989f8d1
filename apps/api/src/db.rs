use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// An evaluation run holds at most one connection at a time (candidates are
/// processed sequentially); the rest serve the diagnostic endpoints.
const MAX_CONNECTIONS: u32 = 5;

/// Connects to the database holding `job_postings`, `candidates` and
/// `candidate_scores`. Startup fails if it is unreachable.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await?;

    info!(max_connections = MAX_CONNECTIONS, "PostgreSQL connection pool established");
    Ok(pool)
}
