//! Analysis cache models.
//!
//! Cache entries are content-addressed: the key is the SHA-256 digest of the
//! raw upload plus the analysis kind that produced the text, so a PDF's
//! direct extraction and its OCR reading are cached independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::results::{AnalysisSlot, ClassificationResult, EntitySet, SentimentResult, SummaryResult};

/// Compute the SHA-256 content hash of raw bytes as a 64-char hex digest.
///
/// Depends only on the byte sequence, never on filename or MIME metadata.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Which extraction path produced the cached text.
///
/// Kept as part of the cache key because the two paths may legitimately
/// disagree (a PDF with embedded text vs. its OCR reading).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    TextExtraction,
    Ocr,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextExtraction => "text_extraction",
            Self::Ocr => "ocr",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text_extraction" => Some(Self::TextExtraction),
            "ocr" => Some(Self::Ocr),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quality indicators attached to extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    /// Overall confidence in [0.0, 1.0].
    pub overall_confidence: f64,
    /// Per-character confidence statistics, when the backend reports them.
    pub character_confidence: Option<ConfidenceStats>,
}

/// Min/max/average statistics over per-unit confidences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl ConfidenceMetrics {
    /// Fixed high confidence for digital text that needed no OCR.
    pub fn digital_text() -> Self {
        Self {
            overall_confidence: 0.95,
            character_confidence: Some(ConfidenceStats {
                average: 0.95,
                min: 0.90,
                max: 1.0,
            }),
        }
    }
}

/// Wall-clock timings for the stages of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    pub extraction_ms: u64,
    pub analysis_ms: Option<u64>,
    pub total_ms: u64,
}

/// A cached analysis result for one (content hash, analysis kind) pair.
///
/// Result slots accumulate: a write to one slot never clears a populated
/// sibling. Entries expire `expiry_at` after creation and are removed by
/// the sweep.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub content_hash: String,
    pub analysis_kind: AnalysisKind,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub storage_path: Option<String>,
    pub extracted_text: Option<String>,
    pub sentiment: Option<AnalysisSlot<SentimentResult>>,
    pub entities: Option<AnalysisSlot<EntitySet>>,
    pub summary: Option<AnalysisSlot<SummaryResult>>,
    pub classification: Option<AnalysisSlot<ClassificationResult>>,
    pub confidence: Option<ConfidenceMetrics>,
    pub processing: Option<ProcessingMetrics>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub expiry_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether every analyzer slot holds a result (error markers count:
    /// a failed analyzer is not retried within the entry's lifetime).
    pub fn has_all_results(&self) -> bool {
        self.sentiment.is_some()
            && self.entities.is_some()
            && self.summary.is_some()
            && self.classification.is_some()
    }

    /// Whether extraction has completed for this entry. Rows without text
    /// are in-flight claims and are treated as misses by the fast path.
    pub fn has_text(&self) -> bool {
        self.extracted_text.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_64_hex_chars() {
        let hash = content_hash(b"Hello, World!");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_content_hash_deterministic() {
        assert_eq!(content_hash(b"same bytes"), content_hash(b"same bytes"));
    }

    #[test]
    fn test_content_hash_distinct_inputs() {
        assert_ne!(content_hash(b"one document"), content_hash(b"another document"));
    }

    #[test]
    fn test_analysis_kind_round_trip() {
        for kind in [AnalysisKind::TextExtraction, AnalysisKind::Ocr] {
            assert_eq!(AnalysisKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(AnalysisKind::from_str("sentiment"), None);
    }
}
