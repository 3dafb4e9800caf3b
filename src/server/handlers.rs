//! API endpoint handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::models::AnalysisKind;
use crate::pipeline::{AnalyzerSelection, PipelineError, ProcessRequest};
use crate::utils::mime;

use super::AppState;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// API error with an HTTP status and JSON body.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        let status = match &e {
            PipelineError::UnsupportedMimeType(_) | PipelineError::UnsupportedAnalysisType(_) => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Store(_) | PipelineError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

/// Upload a document for processing.
///
/// Multipart fields: `file` (required), `analysis_type`
/// (`text_extraction` | `ocr`, default `text_extraction`), and
/// `run_analysis` (boolean, default false).
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut content: Option<Vec<u8>> = None;
    let mut filename = String::from("upload");
    let mut declared_mime: Option<String> = None;
    let mut analysis_type = String::from("text_extraction");
    let mut run_analysis = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                if let Some(name) = field.file_name() {
                    filename = name.to_string();
                }
                declared_mime = field.content_type().map(|m| m.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read file: {e}")))?;
                content = Some(bytes.to_vec());
            }
            Some("analysis_type") => {
                analysis_type = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid analysis_type: {e}")))?;
            }
            Some("run_analysis") | Some("ai_analysis") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid run_analysis: {e}")))?;
                run_analysis = matches!(value.trim(), "true" | "1" | "on" | "yes");
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("missing file field"))?;
    if content.is_empty() {
        return Err(ApiError::bad_request("uploaded file is empty"));
    }

    let kind = AnalysisKind::from_str(&analysis_type)
        .ok_or_else(|| ApiError::from(PipelineError::UnsupportedAnalysisType(analysis_type)))?;

    let mime_type = declared_mime
        .filter(|m| m != "application/octet-stream")
        .or_else(|| mime::from_filename(&filename))
        .ok_or_else(|| ApiError::bad_request("could not determine content type"))?;

    let result = state
        .pipeline
        .process(ProcessRequest {
            content,
            mime_type,
            filename,
            kind,
            run_analysis,
        })
        .await?;

    Ok(Json(result).into_response())
}

/// Request body for text analysis.
#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub text: String,
    /// Analyzer names to run; all four when omitted.
    /// Known names: sentiment, classification, entities, summary.
    pub analyzers: Option<Vec<String>>,
}

/// Analyze caller-supplied text without touching the cache or job stores.
pub async fn analyze_text(
    State(state): State<AppState>,
    Json(params): Json<AnalyzeParams>,
) -> Result<Response, ApiError> {
    if params.text.trim().chars().count() < state.min_text_chars {
        return Err(ApiError::bad_request("text content too short for analysis"));
    }

    let selection = match &params.analyzers {
        None => AnalyzerSelection::default(),
        Some(names) => {
            let requested = |name: &str| names.iter().any(|n| n == name);
            let selection = AnalyzerSelection {
                sentiment: requested("sentiment"),
                classification: requested("classification"),
                entities: requested("entities"),
                summary: requested("summary"),
            };
            if !selection.sentiment
                && !selection.classification
                && !selection.entities
                && !selection.summary
            {
                return Err(ApiError::bad_request("no known analyzers requested"));
            }
            selection
        }
    };

    let report = state.pipeline.analyze_text(&params.text, selection).await;
    Ok(Json(report).into_response())
}

/// Poll a processing job's status.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let job = state
        .pipeline
        .jobs()
        .get(&job_id)
        .await
        .map_err(|e| ApiError::from(PipelineError::Store(e)))?
        .ok_or_else(|| ApiError::not_found(format!("job {job_id} not found")))?;

    Ok(Json(job).into_response())
}

/// Aggregated stage durations (p50/p95 per stage and file type).
pub async fn metrics_stats(State(state): State<AppState>) -> Result<Response, ApiError> {
    let stats = state
        .pipeline
        .metrics()
        .stage_stats()
        .await
        .map_err(|e| ApiError::from(PipelineError::Store(e)))?;

    Ok(Json(stats).into_response())
}

/// Remove expired cache entries now.
pub async fn sweep_cache(State(state): State<AppState>) -> Result<Response, ApiError> {
    let removed = state
        .pipeline
        .cache()
        .sweep_expired(chrono::Utc::now())
        .await
        .map_err(|e| ApiError::from(PipelineError::Store(e)))?;

    Ok(Json(serde_json::json!({ "removed": removed })).into_response())
}
