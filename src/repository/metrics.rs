//! Append-only performance metric store.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::{JobStage, MetricRecord, StageStats};
use crate::schema::performance_metrics;

use super::pool::SqlitePool;
use super::records::{NewPerformanceMetric, PerformanceMetricRecord};
use super::{fmt_datetime, StoreError};

/// Store for per-stage performance records. Records are never updated or
/// deleted by normal operation; aggregation happens offline.
#[derive(Clone)]
pub struct MetricsRepository {
    pool: SqlitePool,
}

impl MetricsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one metric record.
    pub async fn record(
        &self,
        job_id: Option<&str>,
        stage: JobStage,
        mime_type: &str,
        duration_ms: u64,
        size_bytes: Option<u64>,
        confidence_score: Option<f64>,
    ) -> Result<MetricRecord, StoreError> {
        let mut conn = self.pool.get().await?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = fmt_datetime(Utc::now());

        let new_metric = NewPerformanceMetric {
            id: &id,
            job_id,
            stage: stage.as_str(),
            mime_type,
            size_bytes: size_bytes.map(|s| s as i64),
            duration_ms: duration_ms.min(i32::MAX as u64) as i32,
            confidence_score,
            recorded_at: &now,
        };

        diesel::insert_into(performance_metrics::table)
            .values(&new_metric)
            .execute(&mut conn)
            .await?;

        let record: PerformanceMetricRecord = performance_metrics::table
            .find(&id)
            .select(PerformanceMetricRecord::as_select())
            .first(&mut conn)
            .await?;

        Ok(MetricRecord::from(record))
    }

    /// All records for one job, oldest first.
    pub async fn for_job(&self, job_id: &str) -> Result<Vec<MetricRecord>, StoreError> {
        let mut conn = self.pool.get().await?;

        let records: Vec<PerformanceMetricRecord> = performance_metrics::table
            .filter(performance_metrics::job_id.eq(job_id))
            .order(performance_metrics::recorded_at.asc())
            .select(PerformanceMetricRecord::as_select())
            .load(&mut conn)
            .await?;

        Ok(records.into_iter().map(MetricRecord::from).collect())
    }

    /// Aggregate durations per (stage, mime type): count, p50, p95, mean.
    pub async fn stage_stats(&self) -> Result<Vec<StageStats>, StoreError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(String, String, i32)> = performance_metrics::table
            .select((
                performance_metrics::stage,
                performance_metrics::mime_type,
                performance_metrics::duration_ms,
            ))
            .load(&mut conn)
            .await?;

        let mut grouped: std::collections::BTreeMap<(String, String), Vec<u64>> =
            std::collections::BTreeMap::new();
        for (stage, mime, duration) in rows {
            grouped
                .entry((stage, mime))
                .or_default()
                .push(duration.max(0) as u64);
        }

        Ok(grouped
            .into_iter()
            .map(|((stage, mime_type), mut durations)| {
                durations.sort_unstable();
                StageStats {
                    stage,
                    mime_type,
                    samples: durations.len() as u64,
                    p50_ms: percentile(&durations, 50),
                    p95_ms: percentile(&durations, 95),
                    mean_ms: durations.iter().sum::<u64>() / durations.len() as u64,
                }
            })
            .collect())
    }
}

/// Nearest-rank percentile over a sorted slice. Empty input yields 0.
fn percentile(sorted: &[u64], pct: u64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (pct * sorted.len() as u64).div_ceil(100);
    let index = rank.saturating_sub(1).min(sorted.len() as u64 - 1);
    sorted[index as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::run_migrations;
    use tempfile::tempdir;

    #[test]
    fn test_percentile_nearest_rank() {
        let values: Vec<u64> = (1..=100).collect();
        assert_eq!(percentile(&values, 50), 50);
        assert_eq!(percentile(&values, 95), 95);
        assert_eq!(percentile(&[42], 95), 42);
        assert_eq!(percentile(&[], 50), 0);
    }

    #[tokio::test]
    async fn test_record_and_aggregate() {
        let dir = tempdir().unwrap();
        let pool = SqlitePool::from_path(&dir.path().join("test.db"));
        run_migrations(pool.database_url()).await.unwrap();
        let repo = MetricsRepository::new(pool);

        for duration in [100u64, 200, 300] {
            repo.record(
                Some("job-1"),
                JobStage::ExtractingText,
                "application/pdf",
                duration,
                Some(2048),
                Some(0.9),
            )
            .await
            .unwrap();
        }
        repo.record(Some("job-1"), JobStage::AiAnalysis, "application/pdf", 50, None, None)
            .await
            .unwrap();

        let for_job = repo.for_job("job-1").await.unwrap();
        assert_eq!(for_job.len(), 4);
        assert_eq!(for_job[0].mime_type, "application/pdf");

        let stats = repo.stage_stats().await.unwrap();
        let extract = stats
            .iter()
            .find(|s| s.stage == "EXTRACTING_TEXT")
            .unwrap();
        assert_eq!(extract.samples, 3);
        assert_eq!(extract.p50_ms, 200);
        assert_eq!(extract.mean_ms, 200);
    }
}
