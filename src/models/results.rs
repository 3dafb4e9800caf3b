//! Typed per-analyzer result schemas.
//!
//! Each analyzer produces a typed result so serialization into the cache
//! cannot fail. The `Degraded` slot variant is reserved for stored data
//! that no longer parses as the typed schema; it surfaces the raw text
//! explicitly instead of silently stringifying.

use serde::{Deserialize, Serialize};

/// Outcome of one analyzer slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisSlot<T> {
    /// The analyzer ran and produced a typed result.
    Ok { result: T },
    /// The analyzer failed; the message is user-visible.
    Error { message: String },
    /// Input was below the minimum length; the analyzer was never invoked.
    InsufficientInput,
    /// Stored data that could not be parsed into the typed schema.
    Degraded { raw: String },
}

impl<T> AnalysisSlot<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Sentiment polarity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// Document-level sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// Positivity score in [0.0, 1.0]; 0.5 is neutral.
    pub score: f64,
}

/// Document classification with evidence confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    /// Confidence in [0.0, 1.0].
    pub confidence: f64,
}

/// Named entities grouped by kind. Each list is deduplicated and sorted
/// so the merged result is deterministic regardless of scan order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySet {
    pub people: Vec<String>,
    pub organizations: Vec<String>,
    pub locations: Vec<String>,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
}

impl EntitySet {
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
            && self.organizations.is_empty()
            && self.locations.is_empty()
            && self.emails.is_empty()
            && self.phone_numbers.is_empty()
    }
}

/// Extractive summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    /// Number of sentences selected from the source text.
    pub sentence_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_serialization_is_tagged() {
        let slot = AnalysisSlot::Ok {
            result: SentimentResult {
                label: SentimentLabel::Positive,
                score: 0.8,
            },
        };
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["result"]["label"], "positive");

        let err: AnalysisSlot<SentimentResult> = AnalysisSlot::Error {
            message: "timed out".into(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "error");
    }

    #[test]
    fn test_slot_round_trip() {
        let slot: AnalysisSlot<EntitySet> = AnalysisSlot::InsufficientInput;
        let json = serde_json::to_string(&slot).unwrap();
        let back: AnalysisSlot<EntitySet> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slot);
    }
}
