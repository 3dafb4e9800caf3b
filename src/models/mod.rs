//! Data models for docsift.

mod cache;
mod job;
mod metric;
mod results;

pub use cache::{
    content_hash, AnalysisKind, CacheEntry, ConfidenceMetrics, ConfidenceStats, ProcessingMetrics,
};
pub use job::{Job, JobStage, JobStatus};
pub use metric::{MetricRecord, StageStats};
pub use results::{
    AnalysisSlot, ClassificationResult, EntitySet, SentimentLabel, SentimentResult, SummaryResult,
};
