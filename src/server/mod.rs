//! HTTP API for the document analysis pipeline.
//!
//! Endpoints:
//! - `POST /api/upload` - multipart upload, runs the full pipeline
//! - `POST /api/analyze` - analyze caller-supplied text (no cache/job)
//! - `GET /api/jobs/:id` - poll job status
//! - `GET /api/metrics` - aggregated stage durations
//! - `POST /api/cache/sweep` - remove expired cache entries
//! - `GET /health`

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::repository::{run_migrations, SqlitePool};

/// Shared state for the API server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub min_text_chars: usize,
}

/// Start the API server, including the periodic cache sweep task.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    settings.ensure_dirs()?;

    let pool = SqlitePool::new(&settings.database_url());
    run_migrations(pool.database_url()).await?;

    let pipeline = Arc::new(Pipeline::new(pool, settings));
    spawn_sweep_task(pipeline.clone(), settings.sweep_interval_secs);

    let state = AppState {
        pipeline,
        min_text_chars: settings.min_text_chars,
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically delete expired cache entries. The first tick fires
/// immediately, so stale entries from previous runs go at startup.
fn spawn_sweep_task(pipeline: Arc<Pipeline>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(60)));
    tokio::spawn(async move {
        loop {
            interval.tick().await;
            match pipeline.cache().sweep_expired(Utc::now()).await {
                Ok(removed) if removed > 0 => {
                    tracing::info!("Background sweep removed {} cache entries", removed);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Cache sweep failed: {}", e),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::path::Path;
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::extract::{DocumentExtractor, Extraction, ExtractionError};
    use crate::models::ConfidenceMetrics;

    /// Extractor stub so router tests never shell out to poppler/tesseract.
    struct StubExtractor;

    impl DocumentExtractor for StubExtractor {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn extract(&self, _path: &Path, _mime: &str) -> Result<Extraction, ExtractionError> {
            Ok(Extraction {
                text: "Stub extracted text for the router tests.".to_string(),
                confidence: Some(ConfidenceMetrics::digital_text()),
                page_count: Some(1),
            })
        }
    }

    async fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.data_dir = dir.path().to_path_buf();
        settings.documents_dir = dir.path().join("documents");
        settings.ensure_dirs().unwrap();

        let pool = SqlitePool::from_path(&dir.path().join("test.db"));
        run_migrations(pool.database_url()).await.unwrap();

        let pipeline = Pipeline::new(pool, &settings)
            .with_extractors(Arc::new(StubExtractor), Arc::new(StubExtractor));

        let state = AppState {
            pipeline: Arc::new(pipeline),
            min_text_chars: settings.min_text_chars,
        };
        (create_router(state), dir)
    }

    fn multipart_body(boundary: &str, analysis_type: &str, run_analysis: bool) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"doc.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"%PDF-1.4 fake document content");
        body.extend_from_slice(
            format!(
                "\r\n--{boundary}\r\nContent-Disposition: form-data; \
                 name=\"analysis_type\"\r\n\r\n{analysis_type}"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "\r\n--{boundary}\r\nContent-Disposition: form-data; \
                 name=\"run_analysis\"\r\n\r\n{run_analysis}"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_returns_pipeline_result() {
        let (app, _dir) = setup_test_app().await;
        let boundary = "test-boundary-7MA4YWxkTrZu0gW";

        let response = app
            .oneshot(
                Request::post("/api/upload")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(multipart_body(boundary, "text_extraction", false)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["cached"], false);
        assert!(json["extracted_text"]
            .as_str()
            .unwrap()
            .contains("Stub extracted text"));
        assert!(json["job_id"].is_string());
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_analysis_type() {
        let (app, _dir) = setup_test_app().await;
        let boundary = "test-boundary-7MA4YWxkTrZu0gW";

        let response = app
            .oneshot(
                Request::post("/api/upload")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(multipart_body(boundary, "sentiment", false)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_text() {
        let (app, _dir) = setup_test_app().await;

        let body = serde_json::json!({
            "text": "The quarterly report shows excellent results and strong growth across the board."
        });
        let response = app
            .oneshot(
                Request::post("/api/analyze")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["sentiment"]["status"], "ok");
        assert_eq!(json["classification"]["status"], "ok");
        assert!(json["stats"]["words"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_analyze_short_text_rejected() {
        let (app, _dir) = setup_test_app().await;

        let body = serde_json::json!({ "text": "short" });
        let response = app
            .oneshot(
                Request::post("/api/analyze")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .oneshot(
                Request::get("/api/jobs/not-a-job")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
