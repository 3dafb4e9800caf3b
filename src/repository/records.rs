//! Diesel ORM models for database tables.
//!
//! These models provide compile-time type checking for database operations.
//! Dates are RFC 3339 TEXT; structured result columns are JSON TEXT of the
//! typed schemas in `models::results`.

use diesel::prelude::*;

use crate::models::{
    AnalysisKind, AnalysisSlot, CacheEntry, Job, JobStage, JobStatus, MetricRecord,
};
use crate::schema;

use super::{parse_datetime, parse_datetime_opt};

/// Analysis cache row from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::analysis_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CacheEntryRecord {
    pub content_hash: String,
    pub analysis_type: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_path: Option<String>,
    pub extracted_text: Option<String>,
    pub sentiment_result: Option<String>,
    pub entities_result: Option<String>,
    pub summary_result: Option<String>,
    pub classification_result: Option<String>,
    pub confidence_metrics: Option<String>,
    pub processing_metrics: Option<String>,
    pub created_at: String,
    pub last_accessed_at: String,
    pub expiry_at: String,
}

/// New analysis cache row for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::analysis_cache)]
pub struct NewCacheEntry<'a> {
    pub content_hash: &'a str,
    pub analysis_type: &'a str,
    pub filename: &'a str,
    pub mime_type: &'a str,
    pub size_bytes: i64,
    pub storage_path: Option<&'a str>,
    pub created_at: &'a str,
    pub last_accessed_at: &'a str,
    pub expiry_at: &'a str,
}

/// Partial update for a cache row. `None` fields are left untouched, which
/// is what keeps populated sibling slots intact across merges.
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = schema::analysis_cache)]
pub struct CacheEntryChanges {
    pub storage_path: Option<String>,
    pub extracted_text: Option<String>,
    pub sentiment_result: Option<String>,
    pub entities_result: Option<String>,
    pub summary_result: Option<String>,
    pub classification_result: Option<String>,
    pub confidence_metrics: Option<String>,
    pub processing_metrics: Option<String>,
    pub last_accessed_at: Option<String>,
}

/// Parse a JSON slot column. Data that no longer matches the typed schema
/// is surfaced as a degraded slot carrying the raw text.
fn parse_slot<T: serde::de::DeserializeOwned>(raw: Option<String>) -> Option<AnalysisSlot<T>> {
    raw.map(|s| serde_json::from_str(&s).unwrap_or(AnalysisSlot::Degraded { raw: s }))
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: Option<String>) -> Option<T> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

impl From<CacheEntryRecord> for CacheEntry {
    fn from(r: CacheEntryRecord) -> Self {
        Self {
            analysis_kind: AnalysisKind::from_str(&r.analysis_type)
                .unwrap_or(AnalysisKind::TextExtraction),
            content_hash: r.content_hash,
            filename: r.filename,
            mime_type: r.mime_type,
            size_bytes: r.size_bytes.max(0) as u64,
            storage_path: r.storage_path,
            extracted_text: r.extracted_text,
            sentiment: parse_slot(r.sentiment_result),
            entities: parse_slot(r.entities_result),
            summary: parse_slot(r.summary_result),
            classification: parse_slot(r.classification_result),
            confidence: parse_json(r.confidence_metrics),
            processing: parse_json(r.processing_metrics),
            created_at: parse_datetime(&r.created_at),
            last_accessed_at: parse_datetime(&r.last_accessed_at),
            expiry_at: parse_datetime(&r.expiry_at),
        }
    }
}

/// Processing job row from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::processing_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct JobRecord {
    pub id: String,
    pub content_hash: String,
    pub analysis_type: String,
    pub status: String,
    pub current_stage: String,
    pub error_message: Option<String>,
    pub error_trace: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

/// New processing job for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::processing_jobs)]
pub struct NewJob<'a> {
    pub id: &'a str,
    pub content_hash: &'a str,
    pub analysis_type: &'a str,
    pub status: &'a str,
    pub current_stage: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

impl From<JobRecord> for Job {
    fn from(r: JobRecord) -> Self {
        Self {
            id: r.id,
            content_hash: r.content_hash,
            analysis_kind: AnalysisKind::from_str(&r.analysis_type)
                .unwrap_or(AnalysisKind::TextExtraction),
            status: JobStatus::from_str(&r.status).unwrap_or(JobStatus::Processing),
            current_stage: JobStage::from_str(&r.current_stage).unwrap_or(JobStage::Uploaded),
            error_message: r.error_message,
            error_trace: r.error_trace,
            created_at: parse_datetime(&r.created_at),
            updated_at: parse_datetime(&r.updated_at),
            completed_at: parse_datetime_opt(r.completed_at),
        }
    }
}

/// Performance metric row from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::performance_metrics)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PerformanceMetricRecord {
    pub id: String,
    pub job_id: Option<String>,
    pub stage: String,
    pub mime_type: String,
    pub size_bytes: Option<i64>,
    pub duration_ms: i32,
    pub confidence_score: Option<f64>,
    pub recorded_at: String,
}

/// New performance metric for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::performance_metrics)]
pub struct NewPerformanceMetric<'a> {
    pub id: &'a str,
    pub job_id: Option<&'a str>,
    pub stage: &'a str,
    pub mime_type: &'a str,
    pub size_bytes: Option<i64>,
    pub duration_ms: i32,
    pub confidence_score: Option<f64>,
    pub recorded_at: &'a str,
}

impl From<PerformanceMetricRecord> for MetricRecord {
    fn from(r: PerformanceMetricRecord) -> Self {
        Self {
            id: r.id,
            job_id: r.job_id,
            stage: JobStage::from_str(&r.stage).unwrap_or(JobStage::Processing),
            mime_type: r.mime_type,
            size_bytes: r.size_bytes.map(|s| s.max(0) as u64),
            duration_ms: r.duration_ms.max(0) as u64,
            confidence_score: r.confidence_score,
            recorded_at: parse_datetime(&r.recorded_at),
        }
    }
}
