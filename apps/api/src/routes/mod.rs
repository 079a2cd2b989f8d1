pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/analyze", post(handlers::handle_analyze))
        // Diagnostics
        .route("/api/v1/jobs", get(handlers::handle_list_jobs))
        .route("/api/v1/scores", get(handlers::handle_score_overview))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::evaluation::orchestrator::EvaluationRunner;
    use crate::test_support::{
        candidate, job, InMemoryCvStore, InMemoryStore, PlainTextExtractor, ScriptedProvider,
    };

    struct Harness {
        store: Arc<InMemoryStore>,
        router: Router,
    }

    fn harness(store: InMemoryStore, cv_store: InMemoryCvStore) -> Harness {
        let store = Arc::new(store);
        let runner = EvaluationRunner::new(
            store.clone(),
            Arc::new(cv_store),
            Arc::new(PlainTextExtractor),
            Arc::new(ScriptedProvider::scoring(
                72,
                json!({"full_name": "Jane Doe", "phone": "555-0100"}),
            )),
        );
        let router = build_router(AppState::new(store.clone(), runner));
        Harness { store, router }
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_route() {
        let h = harness(InMemoryStore::default(), InMemoryCvStore::default());
        let request = Request::get("/health").body(Body::empty()).unwrap();

        let (status, body) = send(h.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_runs_and_reports_summary() {
        let c = candidate("Jane Doe", Some("555-0100"));
        let cvs = InMemoryCvStore::default();
        cvs.put_cv(&c, "Jane Doe, 7 years of Rust");
        let h = harness(
            InMemoryStore::new(vec![job("Backend"), job("Frontend")], vec![c.clone()]),
            cvs,
        );

        let request = Request::post("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"job_id": "ignored"}"#))
            .unwrap();

        let (status, body) = send(h.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Analysis completed successfully");
        assert_eq!(body["summary"]["evaluated"], 1);
        assert_eq!(body["summary"]["scores_written"], 2);
        assert_eq!(h.store.scores_for(c.id).len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_accepts_empty_body() {
        let h = harness(InMemoryStore::default(), InMemoryCvStore::default());
        let request = Request::post("/analyze").body(Body::empty()).unwrap();

        let (status, body) = send(h.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["summary"]["open_jobs"], 0);
    }

    #[tokio::test]
    async fn test_analyze_store_failure_returns_error_envelope() {
        let store = InMemoryStore::new(vec![job("Backend")], vec![]);
        store.fail_reads();
        let h = harness(store, InMemoryCvStore::default());
        let request = Request::post("/analyze").body(Body::empty()).unwrap();

        let (status, body) = send(h.router, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_list_jobs() {
        let mut closed = job("Archived");
        closed.status = "closed".to_string();
        let h = harness(
            InMemoryStore::new(vec![job("Backend"), closed], vec![]),
            InMemoryCvStore::default(),
        );
        let request = Request::get("/api/v1/jobs").body(Body::empty()).unwrap();

        let (status, body) = send(h.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["jobs"][1]["status"], "closed");
    }

    #[tokio::test]
    async fn test_score_overview_samples_at_most_five() {
        let jobs: Vec<_> = (0..7).map(|i| job(&format!("Job {i}"))).collect();
        let c = candidate("Jane Doe", Some("555-0100"));
        let cvs = InMemoryCvStore::default();
        cvs.put_cv(&c, "Jane Doe");
        let h = harness(InMemoryStore::new(jobs, vec![c]), cvs);

        let (status, _) = send(
            h.router.clone(),
            Request::post("/analyze").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            h.router,
            Request::get("/api/v1/scores").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 7);
        assert_eq!(body["sample"].as_array().unwrap().len(), 5);
        assert_eq!(body["sample"][0]["overall_score"], 72);
    }
}
