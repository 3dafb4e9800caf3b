//! Text analysis backends.
//!
//! Each analysis concern is a trait so the pipeline receives its analyzers
//! by injection; there is no process-wide analyzer state. The bundled
//! implementations are deliberately simple heuristics - swapping in model
//! backed ones means implementing the trait, nothing else.

mod classifier;
mod entities;
mod sentiment;
mod stats;
mod summarizer;

pub use classifier::KeywordClassifier;
pub use entities::RegexEntityExtractor;
pub use sentiment::LexiconSentiment;
pub use stats::{word_frequencies, TextStats, WordCount};
pub use summarizer::FrequencySummarizer;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ClassificationResult, EntitySet, SentimentResult, SummaryResult};

/// Errors from analysis backends.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analysis failed: {0}")]
    Failed(String),

    #[error("analysis timed out after {0} seconds")]
    TimedOut(u64),
}

/// Document-level sentiment scoring.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<SentimentResult, AnalyzerError>;
}

/// Document type classification.
#[async_trait]
pub trait DocumentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, AnalyzerError>;
}

/// Named entity extraction.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<EntitySet, AnalyzerError>;
}

/// Extractive summarization.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<SummaryResult, AnalyzerError>;
}

/// The analyzer bundle handed to the pipeline at construction.
#[derive(Clone)]
pub struct AnalyzerSet {
    pub sentiment: Arc<dyn SentimentAnalyzer>,
    pub classifier: Arc<dyn DocumentClassifier>,
    pub entities: Arc<dyn EntityExtractor>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl AnalyzerSet {
    /// The bundled heuristic backends.
    pub fn heuristic() -> Self {
        Self {
            sentiment: Arc::new(LexiconSentiment::new()),
            classifier: Arc::new(KeywordClassifier::new()),
            entities: Arc::new(RegexEntityExtractor::new()),
            summarizer: Arc::new(FrequencySummarizer::new()),
        }
    }

    pub fn with_sentiment(mut self, sentiment: Arc<dyn SentimentAnalyzer>) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn DocumentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_entities(mut self, entities: Arc<dyn EntityExtractor>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }
}
