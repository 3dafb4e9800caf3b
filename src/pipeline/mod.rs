//! Pipeline orchestration.
//!
//! One `process` call drives hashing, cache lookup, extraction, the
//! analyzer fan-out, cache writes, and job advancement. The cache's
//! composite key is the only cross-request coordination point: the row is
//! claimed with an atomic create before extraction, so concurrent requests
//! for the same content cannot both insert and at most one normally
//! extracts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Future;
use serde::Serialize;
use thiserror::Error;

use crate::analysis::{AnalyzerError, AnalyzerSet, TextStats};
use crate::config::Settings;
use crate::extract::{DocumentExtractor, ExtractionError, PdftotextExtractor, TesseractExtractor};
use crate::models::{
    content_hash, AnalysisKind, AnalysisSlot, CacheEntry, ClassificationResult, ConfidenceMetrics,
    EntitySet, Job, JobStage, JobStatus, ProcessingMetrics, SentimentResult, SummaryResult,
};
use crate::repository::{
    AnalysisCacheRepository, CacheUpdate, JobRepository, MetricsRepository, SqlitePool, StoreError,
};
use crate::storage;
use crate::utils::mime;

/// Errors surfaced by `process`. The pipeline never retries internally;
/// retries are a caller concern.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported file type: {0}")]
    UnsupportedMimeType(String),

    #[error("Unsupported analysis type: {0}")]
    UnsupportedAnalysisType(String),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One incoming processing request.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub content: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
    pub kind: AnalysisKind,
    pub run_analysis: bool,
}

/// The merged outcome of one pipeline run (or a cache hit).
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Absent on the cache-hit fast path, where no job is created.
    pub job_id: Option<String>,
    pub content_hash: String,
    pub analysis_kind: AnalysisKind,
    pub status: JobStatus,
    pub cached: bool,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub extracted_text: Option<String>,
    pub sentiment: Option<AnalysisSlot<SentimentResult>>,
    pub classification: Option<AnalysisSlot<ClassificationResult>>,
    pub entities: Option<AnalysisSlot<EntitySet>>,
    pub summary: Option<AnalysisSlot<SummaryResult>>,
    pub confidence: Option<ConfidenceMetrics>,
    pub processing: Option<ProcessingMetrics>,
    pub stats: Option<TextStats>,
}

impl PipelineResult {
    fn from_entry(entry: CacheEntry, job_id: Option<String>, status: JobStatus, cached: bool) -> Self {
        let stats = entry
            .extracted_text
            .as_deref()
            .map(TextStats::from_text);
        Self {
            job_id,
            content_hash: entry.content_hash,
            analysis_kind: entry.analysis_kind,
            status,
            cached,
            filename: entry.filename,
            mime_type: entry.mime_type,
            size_bytes: entry.size_bytes,
            extracted_text: entry.extracted_text,
            sentiment: entry.sentiment,
            classification: entry.classification,
            entities: entry.entities,
            summary: entry.summary,
            confidence: entry.confidence,
            processing: entry.processing,
            stats,
        }
    }
}

/// Report from analyzing caller-supplied text outside the cache/job flow.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub sentiment: Option<AnalysisSlot<SentimentResult>>,
    pub classification: Option<AnalysisSlot<ClassificationResult>>,
    pub entities: Option<AnalysisSlot<EntitySet>>,
    pub summary: Option<AnalysisSlot<SummaryResult>>,
    pub stats: TextStats,
}

/// Which analyzers an `analyze_text` call should run.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerSelection {
    pub sentiment: bool,
    pub classification: bool,
    pub entities: bool,
    pub summary: bool,
}

impl Default for AnalyzerSelection {
    fn default() -> Self {
        Self {
            sentiment: true,
            classification: true,
            entities: true,
            summary: true,
        }
    }
}

/// The pipeline orchestrator. Holds its collaborators by injection; no
/// process-wide state is shared between concurrent runs except the stores.
#[derive(Clone)]
pub struct Pipeline {
    cache: AnalysisCacheRepository,
    jobs: JobRepository,
    metrics: MetricsRepository,
    text_extractor: Arc<dyn DocumentExtractor>,
    ocr_extractor: Arc<dyn DocumentExtractor>,
    analyzers: AnalyzerSet,
    documents_dir: PathBuf,
    min_text_chars: usize,
    analyzer_timeout: Duration,
}

impl Pipeline {
    /// Build a pipeline with the default extraction and analyzer backends.
    pub fn new(pool: SqlitePool, settings: &Settings) -> Self {
        Self {
            cache: AnalysisCacheRepository::new(pool.clone(), settings.cache_ttl_hours),
            jobs: JobRepository::new(pool.clone()),
            metrics: MetricsRepository::new(pool),
            text_extractor: Arc::new(
                PdftotextExtractor::new().with_language(&settings.tesseract_lang),
            ),
            ocr_extractor: Arc::new(
                TesseractExtractor::new().with_language(&settings.tesseract_lang),
            ),
            analyzers: AnalyzerSet::heuristic(),
            documents_dir: settings.documents_dir.clone(),
            min_text_chars: settings.min_text_chars,
            analyzer_timeout: Duration::from_secs(settings.analyzer_timeout_secs),
        }
    }

    /// Substitute extraction backends (tests, alternative engines).
    pub fn with_extractors(
        mut self,
        text_extractor: Arc<dyn DocumentExtractor>,
        ocr_extractor: Arc<dyn DocumentExtractor>,
    ) -> Self {
        self.text_extractor = text_extractor;
        self.ocr_extractor = ocr_extractor;
        self
    }

    /// Substitute the analyzer bundle.
    pub fn with_analyzers(mut self, analyzers: AnalyzerSet) -> Self {
        self.analyzers = analyzers;
        self
    }

    pub fn cache(&self) -> &AnalysisCacheRepository {
        &self.cache
    }

    pub fn jobs(&self) -> &JobRepository {
        &self.jobs
    }

    pub fn metrics(&self) -> &MetricsRepository {
        &self.metrics
    }

    /// Run the full pipeline for one request.
    pub async fn process(&self, request: ProcessRequest) -> Result<PipelineResult, PipelineError> {
        let declared_mime = mime::normalize(&request.mime_type);
        if !mime::is_supported(&declared_mime) {
            return Err(PipelineError::UnsupportedMimeType(declared_mime));
        }

        let hash = content_hash(&request.content);
        let total_start = Instant::now();

        let existing = self.cache.lookup(&hash, request.kind).await?;
        if let Some(entry) = &existing {
            if entry.has_text() && (!request.run_analysis || entry.has_all_results()) {
                tracing::debug!("Cache hit for ({}, {})", hash, request.kind);
                return Ok(PipelineResult::from_entry(
                    entry.clone(),
                    None,
                    JobStatus::Completed,
                    true,
                ));
            }
        }

        let job = self.jobs.create(&hash, request.kind).await?;
        tracing::info!(
            "Job {} started: {} ({}, {} bytes)",
            job.id,
            request.filename,
            request.kind,
            request.content.len()
        );

        match self
            .run_stages(&job, &hash, declared_mime, existing, &request, total_start)
            .await
        {
            Ok(result) => Ok(result),
            Err(e) => {
                self.fail_job(&job.id, &e).await;
                Err(e)
            }
        }
    }

    /// Analyze caller-supplied text with a subset of analyzers. No job is
    /// created and nothing is cached.
    pub async fn analyze_text(&self, text: &str, selection: AnalyzerSelection) -> AnalysisReport {
        let too_short = self.below_min_length(text);

        let sentiment = async {
            match (selection.sentiment, too_short) {
                (false, _) => None,
                (true, true) => Some(AnalysisSlot::InsufficientInput),
                (true, false) => Some(self.bounded(self.analyzers.sentiment.analyze(text)).await),
            }
        };
        let classification = async {
            match (selection.classification, too_short) {
                (false, _) => None,
                (true, true) => Some(AnalysisSlot::InsufficientInput),
                (true, false) => Some(self.bounded(self.analyzers.classifier.classify(text)).await),
            }
        };
        let entities = async {
            match (selection.entities, too_short) {
                (false, _) => None,
                (true, true) => Some(AnalysisSlot::InsufficientInput),
                (true, false) => Some(self.bounded(self.analyzers.entities.extract(text)).await),
            }
        };
        let summary = async {
            match (selection.summary, too_short) {
                (false, _) => None,
                (true, true) => Some(AnalysisSlot::InsufficientInput),
                (true, false) => Some(self.bounded(self.analyzers.summarizer.summarize(text)).await),
            }
        };

        let (sentiment, classification, entities, summary) =
            tokio::join!(sentiment, classification, entities, summary);

        AnalysisReport {
            sentiment,
            classification,
            entities,
            summary,
            stats: TextStats::from_text(text),
        }
    }

    async fn run_stages(
        &self,
        job: &Job,
        hash: &str,
        declared_mime: String,
        existing: Option<CacheEntry>,
        request: &ProcessRequest,
        total_start: Instant,
    ) -> Result<PipelineResult, PipelineError> {
        let kind = request.kind;
        let size = request.content.len() as u64;

        // PREPROCESSING: verify the declared type against magic bytes,
        // persist the content, and claim the cache row.
        self.jobs
            .advance(&job.id, JobStatus::Processing, JobStage::Preprocessing, None, None)
            .await?;

        let effective_mime = match mime::detect_mime_mismatch(&request.content, &declared_mime) {
            Some((detected, declared)) if mime::is_supported(&detected) => {
                tracing::warn!(
                    "Declared MIME {} does not match content; using detected {}",
                    declared,
                    detected
                );
                detected
            }
            Some((detected, _)) => {
                return Err(PipelineError::UnsupportedMimeType(detected));
            }
            None => declared_mime,
        };

        let storage_path =
            storage::save_content(&request.content, hash, &effective_mime, &self.documents_dir)?;
        let storage_path_str = storage_path.display().to_string();

        // Text already cached by a finished run (or a won race) is reused;
        // extraction happens at most once per key under normal operation.
        // The cached extraction duration rides along for the metrics merge.
        let mut cached_text: Option<(String, u64)> = None;

        match &existing {
            Some(entry) => {
                if let Some(text) = &entry.extracted_text {
                    let prior_ms = entry.processing.as_ref().map(|p| p.extraction_ms).unwrap_or(0);
                    cached_text = Some((text.clone(), prior_ms));
                }
            }
            None => {
                let created = self
                    .cache
                    .create(
                        hash,
                        kind,
                        &request.filename,
                        &effective_mime,
                        size,
                        Some(&storage_path_str),
                    )
                    .await;

                match created {
                    Ok(_) => {}
                    Err(StoreError::DuplicateKey { .. }) => {
                        tracing::debug!(
                            "Lost create race for ({}, {}); merging into winner's row",
                            hash,
                            kind
                        );
                        if let Some(entry) = self.cache.lookup(hash, kind).await? {
                            if let Some(text) = entry.extracted_text {
                                let prior_ms =
                                    entry.processing.as_ref().map(|p| p.extraction_ms).unwrap_or(0);
                                cached_text = Some((text, prior_ms));
                            }
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        // Extraction stage (skipped entirely when the text is already known).
        let (text, extraction_ms) = match cached_text {
            Some((text, prior_ms)) => (text, prior_ms),
            None => {
                let stage = match kind {
                    AnalysisKind::TextExtraction => JobStage::ExtractingText,
                    AnalysisKind::Ocr => JobStage::Ocr,
                };
                self.jobs
                    .advance(&job.id, JobStatus::Processing, stage, None, None)
                    .await?;

                let extractor = match kind {
                    AnalysisKind::TextExtraction => self.text_extractor.clone(),
                    AnalysisKind::Ocr => self.ocr_extractor.clone(),
                };
                let path = storage_path.clone();
                let mime_for_extract = effective_mime.clone();

                let started = Instant::now();
                let extraction =
                    tokio::task::spawn_blocking(move || extractor.extract(&path, &mime_for_extract))
                        .await
                        .map_err(|e| {
                            ExtractionError::ExtractionFailed(format!("worker panicked: {e}"))
                        })??;
                let elapsed_ms = started.elapsed().as_millis() as u64;

                self.metrics
                    .record(
                        Some(&job.id),
                        stage,
                        &effective_mime,
                        elapsed_ms,
                        Some(size),
                        extraction
                            .confidence
                            .as_ref()
                            .map(|c| c.overall_confidence),
                    )
                    .await?;

                self.cache
                    .update(
                        hash,
                        kind,
                        CacheUpdate {
                            extracted_text: Some(extraction.text.clone()),
                            confidence: extraction.confidence.clone(),
                            storage_path: Some(storage_path_str.clone()),
                            ..Default::default()
                        },
                    )
                    .await?;

                (extraction.text, elapsed_ms)
            }
        };

        // AI analysis stage: four independent analyzers, isolated failures.
        let mut slots: Option<AnalyzerSlots> = None;
        let mut analysis_ms = None;

        if request.run_analysis {
            self.jobs
                .advance(&job.id, JobStatus::Processing, JobStage::AiAnalysis, None, None)
                .await?;

            let started = Instant::now();
            let run = self.run_analyzers(&text).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            analysis_ms = Some(elapsed_ms);

            self.metrics
                .record(
                    Some(&job.id),
                    JobStage::AiAnalysis,
                    &effective_mime,
                    elapsed_ms,
                    Some(size),
                    None,
                )
                .await?;

            slots = Some(run);
        } else {
            self.jobs
                .advance(&job.id, JobStatus::Processing, JobStage::Processing, None, None)
                .await?;
        }

        let processing = ProcessingMetrics {
            extraction_ms,
            analysis_ms,
            total_ms: total_start.elapsed().as_millis() as u64,
        };

        let entry = self
            .cache
            .update(
                hash,
                kind,
                CacheUpdate {
                    sentiment: slots.as_ref().map(|s| s.sentiment.clone()),
                    classification: slots.as_ref().map(|s| s.classification.clone()),
                    entities: slots.as_ref().map(|s| s.entities.clone()),
                    summary: slots.as_ref().map(|s| s.summary.clone()),
                    processing: Some(processing),
                    ..Default::default()
                },
            )
            .await?;

        // All requested analyzers failing fails the job; partial failures
        // complete with error markers in the failed slots.
        let status = match slots.as_ref().and_then(AnalyzerSlots::unanimous_failure) {
            Some(message) => {
                self.jobs
                    .advance(
                        &job.id,
                        JobStatus::Error,
                        JobStage::Error,
                        Some(&message),
                        None,
                    )
                    .await?;
                tracing::warn!("Job {} failed: all analyzers failed", job.id);
                JobStatus::Error
            }
            None => {
                self.jobs
                    .advance(&job.id, JobStatus::Completed, JobStage::Completed, None, None)
                    .await?;
                tracing::info!("Job {} completed", job.id);
                JobStatus::Completed
            }
        };

        Ok(PipelineResult::from_entry(entry, Some(job.id.clone()), status, false))
    }

    /// Run the four analyzers concurrently, each isolated and bounded by
    /// the configured timeout. Results are joined into named slots, so the
    /// merged outcome is deterministic regardless of completion order.
    async fn run_analyzers(&self, text: &str) -> AnalyzerSlots {
        if self.below_min_length(text) {
            tracing::debug!("Text below minimum length; skipping analyzers");
            return AnalyzerSlots {
                sentiment: AnalysisSlot::InsufficientInput,
                classification: AnalysisSlot::InsufficientInput,
                entities: AnalysisSlot::InsufficientInput,
                summary: AnalysisSlot::InsufficientInput,
            };
        }

        let (sentiment, classification, entities, summary) = tokio::join!(
            self.bounded(self.analyzers.sentiment.analyze(text)),
            self.bounded(self.analyzers.classifier.classify(text)),
            self.bounded(self.analyzers.entities.extract(text)),
            self.bounded(self.analyzers.summarizer.summarize(text)),
        );

        AnalyzerSlots {
            sentiment,
            classification,
            entities,
            summary,
        }
    }

    fn below_min_length(&self, text: &str) -> bool {
        text.trim().chars().count() < self.min_text_chars
    }

    /// Wrap one analyzer call: a failure or timeout becomes that slot's
    /// error marker and never aborts the sibling analyzers.
    async fn bounded<T, F>(&self, fut: F) -> AnalysisSlot<T>
    where
        F: Future<Output = Result<T, AnalyzerError>>,
    {
        match tokio::time::timeout(self.analyzer_timeout, fut).await {
            Ok(Ok(result)) => AnalysisSlot::Ok { result },
            Ok(Err(e)) => AnalysisSlot::Error {
                message: e.to_string(),
            },
            Err(_) => AnalysisSlot::Error {
                message: AnalyzerError::TimedOut(self.analyzer_timeout.as_secs()).to_string(),
            },
        }
    }

    /// Move a job to ERROR after a stage failure. Secondary store errors
    /// are logged rather than masking the original failure.
    async fn fail_job(&self, job_id: &str, error: &PipelineError) {
        let message = error.to_string();
        let trace = format!("{error:?}");
        if let Err(e) = self
            .jobs
            .advance(
                job_id,
                JobStatus::Error,
                JobStage::Error,
                Some(&message),
                Some(&trace),
            )
            .await
        {
            tracing::error!("Failed to mark job {} as errored: {}", job_id, e);
        } else {
            tracing::warn!("Job {} failed: {}", job_id, message);
        }
    }
}

/// The four analyzer outcomes for one run.
struct AnalyzerSlots {
    sentiment: AnalysisSlot<SentimentResult>,
    classification: AnalysisSlot<ClassificationResult>,
    entities: AnalysisSlot<EntitySet>,
    summary: AnalysisSlot<SummaryResult>,
}

impl AnalyzerSlots {
    /// When every slot holds an error marker, returns the first message.
    /// Insufficient-input slots are not failures.
    fn unanimous_failure(&self) -> Option<String> {
        let all_failed = self.sentiment.is_error()
            && self.classification.is_error()
            && self.entities.is_error()
            && self.summary.is_error();
        if !all_failed {
            return None;
        }
        match &self.sentiment {
            AnalysisSlot::Error { message } => Some(message.clone()),
            _ => None,
        }
    }
}
