use std::sync::Arc;

use tokio::sync::Mutex;

use crate::evaluation::orchestrator::EvaluationRunner;
use crate::storage::MatchStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MatchStore>,
    pub runner: Arc<EvaluationRunner>,
    /// Held for the whole of a run: this process is the only score writer.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<dyn MatchStore>, runner: EvaluationRunner) -> Self {
        Self {
            store,
            runner: Arc::new(runner),
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}
