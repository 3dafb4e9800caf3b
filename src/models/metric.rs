//! Per-stage performance records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::job::JobStage;

/// An immutable record of one processing stage's duration and outcome.
///
/// Weakly references its job: lookup only, no cascading mutation. Consumed
/// by offline aggregation (p50/p95 per stage and file type), never read
/// synchronously by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct MetricRecord {
    pub id: String,
    pub job_id: Option<String>,
    pub stage: JobStage,
    pub mime_type: String,
    pub size_bytes: Option<u64>,
    pub duration_ms: u64,
    pub confidence_score: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregated durations for one (stage, mime type) pair.
#[derive(Debug, Clone, Serialize)]
pub struct StageStats {
    pub stage: String,
    pub mime_type: String,
    pub samples: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub mean_ms: u64,
}
