//! HTTP surface for the transcription pipeline.
//!
//! One pipeline run per request: the handler blocks (asynchronously) until
//! the job completes or fails, then answers with a download reference. Every
//! pipeline failure collapses to a single 400 class with the underlying
//! message as detail; a missing subtitle file is the one distinct 404 class.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use subgen::{Language, Pipeline};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

#[derive(Deserialize)]
pub struct TranscribeRequest {
    url: String,
    #[serde(default)]
    target_language: Option<String>,
}

#[derive(Serialize)]
pub struct TranscribeResponse {
    status: &'static str,
    message: &'static str,
    download_url: String,
    job_id: String,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn bad_request(detail: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "detail": detail.into() })),
    )
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "File not found" })),
    )
}

pub fn build_app(state: AppState) -> Router {
    let downloads_dir = state.pipeline.config().downloads_dir.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/transcribe", post(transcribe))
        .route("/download/:filename", get(download_file))
        .route("/health", get(health))
        .nest_service("/downloads", ServeDir::new(downloads_dir))
        .with_state(state)
        .layer(cors)
}

/// POST /transcribe: run the whole pipeline for one URL.
async fn transcribe(
    State(state): State<AppState>,
    Json(req): Json<TranscribeRequest>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let lang = req.target_language.as_deref().unwrap_or("en");
    let language = Language::new(lang).map_err(|e| bad_request(e.to_string()))?;

    let job = state.pipeline.run(&req.url, language).await.map_err(|e| {
        error!(error = %e, "transcription job failed");
        bad_request(e.to_string())
    })?;

    Ok(Json(TranscribeResponse {
        status: "success",
        message: "Transcription completed successfully",
        download_url: format!("/downloads/{}.srt", job.job_id),
        job_id: job.job_id,
    }))
}

/// GET /download/{filename}: serve a finished subtitle file as an attachment.
async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    // Anything that could climb out of the downloads dir is treated as absent
    if !is_safe_filename(&filename) {
        return Err(not_found());
    }

    let path = state.pipeline.config().downloads_dir.join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(bad_request(e.to_string())),
    };

    let headers = [
        (header::CONTENT_TYPE, "application/x-subrip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];

    Ok((headers, bytes).into_response())
}

/// GET /health: liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use subgen::PipelineConfig;
    use tower::ServiceExt;

    struct TestServer {
        app: Router,
        downloads_dir: std::path::PathBuf,
        _dir: tempfile::TempDir,
    }

    fn test_server() -> TestServer {
        let dir = tempfile::tempdir().unwrap();
        let downloads_dir = dir.path().join("downloads");
        let pipeline = Pipeline::new(
            PipelineConfig::new()
                .uploads_dir(dir.path().join("uploads"))
                .downloads_dir(&downloads_dir),
        )
        .unwrap();

        TestServer {
            app: build_app(AppState {
                pipeline: Arc::new(pipeline),
            }),
            downloads_dir,
            _dir: dir,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let server = test_server();
        let response = server
            .app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn download_missing_file_is_404() {
        let server = test_server();
        let response = server
            .app
            .oneshot(
                Request::get("/download/nope.srt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": "File not found" })
        );
    }

    #[tokio::test]
    async fn download_serves_existing_file() {
        let server = test_server();
        let srt = "1\n00:00:00,000 --> 00:00:01,000\nhi\n";
        std::fs::write(server.downloads_dir.join("abc12345.srt"), srt).unwrap();

        let response = server
            .app
            .oneshot(
                Request::get("/download/abc12345.srt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-subrip"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), srt.as_bytes());
    }

    #[tokio::test]
    async fn static_route_serves_downloads_dir() {
        let server = test_server();
        std::fs::write(server.downloads_dir.join("abc12345.srt"), "1\n").unwrap();

        let response = server
            .app
            .oneshot(
                Request::get("/downloads/abc12345.srt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn transcribe_rejects_invalid_url() {
        let server = test_server();
        let response = server
            .app
            .oneshot(
                Request::post("/transcribe")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"url": "not-a-url"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("invalid URL"));
    }

    #[tokio::test]
    async fn transcribe_rejects_unknown_language() {
        let server = test_server();
        let response = server
            .app
            .oneshot(
                Request::post("/transcribe")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"url": "https://example.com/v", "target_language": "zz"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("unsupported language"));
    }

    #[test]
    fn safe_filename_rejects_traversal() {
        assert!(is_safe_filename("abc12345.srt"));
        assert!(!is_safe_filename("../secrets.txt"));
        assert!(!is_safe_filename("a/b.srt"));
        assert!(!is_safe_filename("a\\b.srt"));
        assert!(!is_safe_filename(""));
    }
}
