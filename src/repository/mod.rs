//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! over async SQLite connections. Timestamps are stored as RFC 3339 TEXT
//! in a fixed-width UTC format so string comparison in SQL matches
//! chronological order.

pub mod cache;
pub mod jobs;
pub mod metrics;
pub mod migrations;
pub mod pool;
pub mod records;

pub use cache::{AnalysisCacheRepository, CacheUpdate};
pub use jobs::JobRepository;
pub use metrics::MetricsRepository;
pub use migrations::run_migrations;
pub use pool::SqlitePool;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Errors from the cache, job, and metric stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row already exists for the composite key. Surfaced by the atomic
    /// insert-if-absent `create`; the caller decides whether to merge.
    #[error("cache entry already exists for ({content_hash}, {analysis_type})")]
    DuplicateKey {
        content_hash: String,
        analysis_type: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected job state transition. Advancing a terminal job is a caller
    /// bug; callers must check status before retrying.
    #[error("invalid job transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Format a timestamp for storage. Microsecond precision with a `Z` suffix
/// keeps the column lexicographically ordered.
pub fn fmt_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}
