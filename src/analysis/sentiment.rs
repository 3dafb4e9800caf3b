//! Lexicon-based sentiment scoring.

use async_trait::async_trait;

use crate::models::{SentimentLabel, SentimentResult};

use super::{AnalyzerError, SentimentAnalyzer};

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "positive", "success", "successful", "improve", "improved",
    "improvement", "benefit", "beneficial", "effective", "achievement", "achieved", "strong",
    "growth", "gain", "advantage", "best", "outstanding", "favorable", "approve", "approved",
    "agree", "happy", "pleased", "confident", "reliable", "secure", "efficient",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "negative", "failure", "failed", "fail", "problem", "problems", "issue",
    "issues", "risk", "risks", "loss", "losses", "decline", "declined", "weak", "worst",
    "damage", "concern", "concerns", "reject", "rejected", "dispute", "breach", "penalty",
    "unfortunately", "error", "errors", "deficient",
];

/// Sentiment analyzer scoring positive/negative lexicon hits.
///
/// Score is positivity in [0.0, 1.0]; 0.5 means no signal either way.
/// Thresholds at 0.6/0.4 map the score to a label.
pub struct LexiconSentiment;

impl LexiconSentiment {
    pub fn new() -> Self {
        Self
    }

    fn score(text: &str) -> f64 {
        let mut positive = 0usize;
        let mut negative = 0usize;

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let lower = word.to_lowercase();
            if POSITIVE_WORDS.contains(&lower.as_str()) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(&lower.as_str()) {
                negative += 1;
            }
        }

        let hits = positive + negative;
        if hits == 0 {
            return 0.5;
        }
        0.5 + 0.5 * (positive as f64 - negative as f64) / hits as f64
    }
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentAnalyzer for LexiconSentiment {
    async fn analyze(&self, text: &str) -> Result<SentimentResult, AnalyzerError> {
        let score = Self::score(text);
        let label = if score > 0.6 {
            SentimentLabel::Positive
        } else if score < 0.4 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };

        Ok(SentimentResult { label, score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_positive_text() {
        let result = LexiconSentiment::new()
            .analyze("The results were excellent and showed great improvement.")
            .await
            .unwrap();
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!(result.score > 0.6);
    }

    #[tokio::test]
    async fn test_negative_text() {
        let result = LexiconSentiment::new()
            .analyze("The project was a failure with serious problems and heavy losses.")
            .await
            .unwrap();
        assert_eq!(result.label, SentimentLabel::Negative);
        assert!(result.score < 0.4);
    }

    #[tokio::test]
    async fn test_no_signal_is_neutral() {
        let result = LexiconSentiment::new()
            .analyze("The meeting is scheduled for Tuesday at noon.")
            .await
            .unwrap();
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert!((result.score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let analyzer = LexiconSentiment::new();
        let text = "good good bad";
        let a = analyzer.analyze(text).await.unwrap();
        let b = analyzer.analyze(text).await.unwrap();
        assert_eq!(a, b);
    }
}
