//! Content-addressed analysis cache store.
//!
//! Rows are keyed by (content hash, analysis kind). `create` is an atomic
//! insert backed by the composite primary key: concurrent callers race on
//! the constraint, exactly one wins, and the losers get `DuplicateKey` to
//! merge via `update` instead. There is no check-then-act window.

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::{
    AnalysisKind, AnalysisSlot, CacheEntry, ClassificationResult, ConfidenceMetrics, EntitySet,
    ProcessingMetrics, SentimentResult, SummaryResult,
};
use crate::schema::analysis_cache;

use super::pool::SqlitePool;
use super::records::{CacheEntryChanges, CacheEntryRecord, NewCacheEntry};
use super::{fmt_datetime, StoreError};

/// Default cache entry lifetime.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Partial update merged into an existing cache entry. `None` fields are
/// left untouched, so populated sibling slots always survive a merge.
#[derive(Debug, Default, Clone)]
pub struct CacheUpdate {
    pub storage_path: Option<String>,
    pub extracted_text: Option<String>,
    pub sentiment: Option<AnalysisSlot<SentimentResult>>,
    pub entities: Option<AnalysisSlot<EntitySet>>,
    pub summary: Option<AnalysisSlot<SummaryResult>>,
    pub classification: Option<AnalysisSlot<ClassificationResult>>,
    pub confidence: Option<ConfidenceMetrics>,
    pub processing: Option<ProcessingMetrics>,
}

impl CacheUpdate {
    pub fn is_empty(&self) -> bool {
        self.storage_path.is_none()
            && self.extracted_text.is_none()
            && self.sentiment.is_none()
            && self.entities.is_none()
            && self.summary.is_none()
            && self.classification.is_none()
            && self.confidence.is_none()
            && self.processing.is_none()
    }

    fn into_changeset(self) -> Result<CacheEntryChanges, serde_json::Error> {
        Ok(CacheEntryChanges {
            storage_path: self.storage_path,
            extracted_text: self.extracted_text,
            sentiment_result: self
                .sentiment
                .map(|s| serde_json::to_string(&s))
                .transpose()?,
            entities_result: self
                .entities
                .map(|s| serde_json::to_string(&s))
                .transpose()?,
            summary_result: self.summary.map(|s| serde_json::to_string(&s)).transpose()?,
            classification_result: self
                .classification
                .map(|s| serde_json::to_string(&s))
                .transpose()?,
            confidence_metrics: self
                .confidence
                .map(|c| serde_json::to_string(&c))
                .transpose()?,
            processing_metrics: self
                .processing
                .map(|p| serde_json::to_string(&p))
                .transpose()?,
            last_accessed_at: None,
        })
    }
}

/// Store for cached extraction and analysis results.
#[derive(Clone)]
pub struct AnalysisCacheRepository {
    pool: SqlitePool,
    ttl: Duration,
}

impl AnalysisCacheRepository {
    /// Create a new cache repository with the given entry lifetime.
    pub fn new(pool: SqlitePool, ttl_hours: i64) -> Self {
        Self {
            pool,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Look up an entry, bumping its last-accessed time on hit.
    pub async fn lookup(
        &self,
        content_hash: &str,
        kind: AnalysisKind,
    ) -> Result<Option<CacheEntry>, StoreError> {
        let mut conn = self.pool.get().await?;

        let record: Option<CacheEntryRecord> = analysis_cache::table
            .find((content_hash, kind.as_str()))
            .select(CacheEntryRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        let Some(record) = record else {
            return Ok(None);
        };

        let touched = fmt_datetime(Utc::now());
        diesel::update(analysis_cache::table.find((content_hash, kind.as_str())))
            .set(analysis_cache::last_accessed_at.eq(&touched))
            .execute(&mut conn)
            .await?;

        let mut entry = CacheEntry::from(record);
        entry.last_accessed_at = super::parse_datetime(&touched);
        Ok(Some(entry))
    }

    /// Create a new entry for the composite key. Atomic: a concurrent
    /// duplicate surfaces as `DuplicateKey` via the unique constraint.
    pub async fn create(
        &self,
        content_hash: &str,
        kind: AnalysisKind,
        filename: &str,
        mime_type: &str,
        size_bytes: u64,
        storage_path: Option<&str>,
    ) -> Result<CacheEntry, StoreError> {
        let mut conn = self.pool.get().await?;

        let now = Utc::now();
        let now_str = fmt_datetime(now);
        let expiry = fmt_datetime(now + self.ttl);

        let new_entry = NewCacheEntry {
            content_hash,
            analysis_type: kind.as_str(),
            filename,
            mime_type,
            size_bytes: size_bytes as i64,
            storage_path,
            created_at: &now_str,
            last_accessed_at: &now_str,
            expiry_at: &expiry,
        };

        let inserted = diesel::insert_into(analysis_cache::table)
            .values(&new_entry)
            .execute(&mut conn)
            .await;

        match inserted {
            Ok(_) => {}
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => {
                return Err(StoreError::DuplicateKey {
                    content_hash: content_hash.to_string(),
                    analysis_type: kind.as_str().to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        }

        self.get(content_hash, kind).await?.ok_or_else(|| {
            StoreError::NotFound(format!("cache entry ({content_hash}, {kind}) after insert"))
        })
    }

    /// Merge non-null fields into an existing entry.
    pub async fn update(
        &self,
        content_hash: &str,
        kind: AnalysisKind,
        changes: CacheUpdate,
    ) -> Result<CacheEntry, StoreError> {
        if changes.is_empty() {
            return self.get(content_hash, kind).await?.ok_or_else(|| {
                StoreError::NotFound(format!("cache entry ({content_hash}, {kind})"))
            });
        }

        let changeset = changes.into_changeset()?;
        let mut conn = self.pool.get().await?;

        let updated = diesel::update(analysis_cache::table.find((content_hash, kind.as_str())))
            .set(&changeset)
            .execute(&mut conn)
            .await?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!(
                "cache entry ({content_hash}, {kind})"
            )));
        }

        self.get(content_hash, kind).await?.ok_or_else(|| {
            StoreError::NotFound(format!("cache entry ({content_hash}, {kind}) after update"))
        })
    }

    /// Delete all entries whose expiry is in the past. Returns the number
    /// removed; calling it again immediately removes nothing.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut conn = self.pool.get().await?;

        let cutoff = fmt_datetime(now);
        let removed = diesel::delete(analysis_cache::table.filter(analysis_cache::expiry_at.lt(&cutoff)))
            .execute(&mut conn)
            .await?;

        if removed > 0 {
            tracing::info!("Swept {} expired cache entries", removed);
        }
        Ok(removed)
    }

    /// Count all cache entries.
    pub async fn count(&self) -> Result<u64, StoreError> {
        use diesel::dsl::count_star;
        let mut conn = self.pool.get().await?;

        let count: i64 = analysis_cache::table
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }

    /// Fetch an entry without touching its access time.
    async fn get(
        &self,
        content_hash: &str,
        kind: AnalysisKind,
    ) -> Result<Option<CacheEntry>, StoreError> {
        let mut conn = self.pool.get().await?;

        let record: Option<CacheEntryRecord> = analysis_cache::table
            .find((content_hash, kind.as_str()))
            .select(CacheEntryRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(record.map(CacheEntry::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;
    use crate::repository::run_migrations;
    use tempfile::tempdir;

    async fn test_repo(ttl_hours: i64) -> (AnalysisCacheRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let pool = SqlitePool::from_path(&db_path);
        run_migrations(pool.database_url()).await.unwrap();
        (AnalysisCacheRepository::new(pool, ttl_hours), dir)
    }

    #[tokio::test]
    async fn test_create_then_lookup_round_trip() {
        let (repo, _dir) = test_repo(24).await;

        let created = repo
            .create(
                "a".repeat(64).as_str(),
                AnalysisKind::TextExtraction,
                "report.pdf",
                "application/pdf",
                1024,
                Some("/docs/aa/aaaaaaaa.pdf"),
            )
            .await
            .unwrap();

        let found = repo
            .lookup(&"a".repeat(64), AnalysisKind::TextExtraction)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.content_hash, created.content_hash);
        assert_eq!(found.filename, "report.pdf");
        assert_eq!(found.mime_type, "application/pdf");
        assert_eq!(found.size_bytes, 1024);
        assert_eq!(found.storage_path.as_deref(), Some("/docs/aa/aaaaaaaa.pdf"));
        assert!(found.extracted_text.is_none());
        assert!(found.expiry_at > found.created_at);
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let (repo, _dir) = test_repo(24).await;
        let hash = "b".repeat(64);

        repo.create(&hash, AnalysisKind::Ocr, "scan.png", "image/png", 10, None)
            .await
            .unwrap();

        let err = repo
            .create(&hash, AnalysisKind::Ocr, "scan.png", "image/png", 10, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));

        // Same hash under the other analysis kind is a distinct key.
        repo.create(&hash, AnalysisKind::TextExtraction, "scan.png", "image/png", 10, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_merges_without_clearing_siblings() {
        let (repo, _dir) = test_repo(24).await;
        let hash = "c".repeat(64);

        repo.create(&hash, AnalysisKind::TextExtraction, "a.pdf", "application/pdf", 5, None)
            .await
            .unwrap();

        repo.update(
            &hash,
            AnalysisKind::TextExtraction,
            CacheUpdate {
                extracted_text: Some("the extracted text".into()),
                sentiment: Some(AnalysisSlot::Ok {
                    result: SentimentResult {
                        label: SentimentLabel::Neutral,
                        score: 0.5,
                    },
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let entry = repo
            .update(
                &hash,
                AnalysisKind::TextExtraction,
                CacheUpdate {
                    summary: Some(AnalysisSlot::Ok {
                        result: SummaryResult {
                            summary: "short".into(),
                            sentence_count: 1,
                        },
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // The earlier sentiment write survived the later summary merge.
        assert_eq!(entry.extracted_text.as_deref(), Some("the extracted text"));
        assert!(entry.sentiment.as_ref().is_some_and(|s| s.is_ok()));
        assert!(entry.summary.as_ref().is_some_and(|s| s.is_ok()));
        assert!(entry.entities.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_key_is_not_found() {
        let (repo, _dir) = test_repo(24).await;

        let err = repo
            .update(
                &"d".repeat(64),
                AnalysisKind::Ocr,
                CacheUpdate {
                    extracted_text: Some("text".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sweep_removes_exactly_expired_and_is_idempotent() {
        let (repo, _dir) = test_repo(24).await;

        repo.create(&"e".repeat(64), AnalysisKind::Ocr, "old.png", "image/png", 1, None)
            .await
            .unwrap();
        repo.create(&"f".repeat(64), AnalysisKind::Ocr, "new.png", "image/png", 1, None)
            .await
            .unwrap();

        // Nothing has expired yet.
        assert_eq!(repo.sweep_expired(Utc::now()).await.unwrap(), 0);

        // A sweep dated after the TTL removes both, a second pass removes none.
        let future = Utc::now() + Duration::hours(25);
        assert_eq!(repo.sweep_expired(future).await.unwrap(), 2);
        assert_eq!(repo.sweep_expired(future).await.unwrap(), 0);
    }
}
