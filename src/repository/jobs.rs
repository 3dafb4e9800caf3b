//! Processing job store.
//!
//! Jobs are mutated exclusively by the pipeline as stages begin and end.
//! Every advance is validated against the total transition function in
//! `models::job`; a rejected transition is a caller bug, not data drift.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::{AnalysisKind, Job, JobStage, JobStatus};
use crate::schema::processing_jobs;

use super::pool::SqlitePool;
use super::records::{JobRecord, NewJob};
use super::{fmt_datetime, StoreError};

/// Store for pipeline processing jobs.
#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a job for a new pipeline run: status PROCESSING, stage UPLOADED.
    pub async fn create(
        &self,
        content_hash: &str,
        kind: AnalysisKind,
    ) -> Result<Job, StoreError> {
        let mut conn = self.pool.get().await?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = fmt_datetime(Utc::now());

        let new_job = NewJob {
            id: &id,
            content_hash,
            analysis_type: kind.as_str(),
            status: JobStatus::Processing.as_str(),
            current_stage: JobStage::Uploaded.as_str(),
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(processing_jobs::table)
            .values(&new_job)
            .execute(&mut conn)
            .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("job {id} after insert")))
    }

    /// Advance a job to a new status/stage.
    ///
    /// Stamps `completed_at` when the status becomes COMPLETED and stores
    /// error fields when it becomes ERROR. Fails with `InvalidTransition`
    /// if the stage move is illegal or the job is already terminal.
    pub async fn advance(
        &self,
        job_id: &str,
        status: JobStatus,
        stage: JobStage,
        error_message: Option<&str>,
        error_trace: Option<&str>,
    ) -> Result<Job, StoreError> {
        let current = self
            .get(job_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("job {job_id}")))?;

        if current.status.is_terminal() || !current.current_stage.can_transition_to(stage) {
            return Err(StoreError::InvalidTransition {
                from: format!("{}/{}", current.status.as_str(), current.current_stage),
                to: format!("{}/{}", status.as_str(), stage),
            });
        }

        let mut conn = self.pool.get().await?;
        let now = fmt_datetime(Utc::now());
        let completed_at = (status == JobStatus::Completed).then(|| now.clone());

        diesel::update(processing_jobs::table.find(job_id))
            .set((
                processing_jobs::status.eq(status.as_str()),
                processing_jobs::current_stage.eq(stage.as_str()),
                processing_jobs::error_message.eq(error_message),
                processing_jobs::error_trace.eq(error_trace),
                processing_jobs::updated_at.eq(&now),
                processing_jobs::completed_at.eq(completed_at),
            ))
            .execute(&mut conn)
            .await?;

        self.get(job_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("job {job_id} after update")))
    }

    /// Fetch a job by id.
    pub async fn get(&self, job_id: &str) -> Result<Option<Job>, StoreError> {
        let mut conn = self.pool.get().await?;

        let record: Option<JobRecord> = processing_jobs::table
            .find(job_id)
            .select(JobRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(record.map(Job::from))
    }

    /// Count all jobs (used by tests and the stats command).
    pub async fn count(&self) -> Result<u64, StoreError> {
        use diesel::dsl::count_star;
        let mut conn = self.pool.get().await?;

        let count: i64 = processing_jobs::table
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::run_migrations;
    use tempfile::tempdir;

    async fn test_repo() -> (JobRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let pool = SqlitePool::from_path(&dir.path().join("test.db"));
        run_migrations(pool.database_url()).await.unwrap();
        (JobRepository::new(pool), dir)
    }

    #[tokio::test]
    async fn test_create_starts_uploaded_processing() {
        let (repo, _dir) = test_repo().await;

        let job = repo.create(&"a".repeat(64), AnalysisKind::Ocr).await.unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.current_stage, JobStage::Uploaded);
        assert!(job.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_advance_through_lifecycle() {
        let (repo, _dir) = test_repo().await;
        let job = repo
            .create(&"b".repeat(64), AnalysisKind::TextExtraction)
            .await
            .unwrap();

        for stage in [
            JobStage::Preprocessing,
            JobStage::ExtractingText,
            JobStage::AiAnalysis,
        ] {
            let advanced = repo
                .advance(&job.id, JobStatus::Processing, stage, None, None)
                .await
                .unwrap();
            assert_eq!(advanced.current_stage, stage);
        }

        let done = repo
            .advance(&job.id, JobStatus::Completed, JobStage::Completed, None, None)
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_stage_cannot_move_backward() {
        let (repo, _dir) = test_repo().await;
        let job = repo.create(&"c".repeat(64), AnalysisKind::Ocr).await.unwrap();

        repo.advance(&job.id, JobStatus::Processing, JobStage::Ocr, None, None)
            .await
            .unwrap();

        let err = repo
            .advance(
                &job.id,
                JobStatus::Processing,
                JobStage::Preprocessing,
                None,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_terminal_jobs_are_immutable() {
        let (repo, _dir) = test_repo().await;
        let job = repo.create(&"d".repeat(64), AnalysisKind::Ocr).await.unwrap();

        let failed = repo
            .advance(
                &job.id,
                JobStatus::Error,
                JobStage::Error,
                Some("extraction failed"),
                Some("trace"),
            )
            .await
            .unwrap();
        assert_eq!(failed.status, JobStatus::Error);
        assert_eq!(failed.error_message.as_deref(), Some("extraction failed"));

        let err = repo
            .advance(&job.id, JobStatus::Completed, JobStage::Completed, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        // The stored record is unchanged after the rejected advance.
        let current = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(current.status, JobStatus::Error);
        assert_eq!(current.current_stage, JobStage::Error);
    }

    #[tokio::test]
    async fn test_advance_unknown_job_is_not_found() {
        let (repo, _dir) = test_repo().await;

        let err = repo
            .advance(
                "no-such-job",
                JobStatus::Processing,
                JobStage::Preprocessing,
                None,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
