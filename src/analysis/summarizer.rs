//! Frequency-scored extractive summarization.

use async_trait::async_trait;

use crate::models::SummaryResult;

use super::stats::word_frequencies;
use super::{AnalyzerError, Summarizer};

/// Summarizer selecting the highest-scoring sentences.
///
/// Sentences are scored by the mean frequency of their content words;
/// the selected sentences are emitted in document order.
pub struct FrequencySummarizer {
    max_sentences: usize,
}

impl FrequencySummarizer {
    pub fn new() -> Self {
        Self { max_sentences: 3 }
    }

    pub fn with_max_sentences(mut self, max: usize) -> Self {
        self.max_sentences = max.max(1);
        self
    }
}

impl Default for FrequencySummarizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Split text into sentences on terminal punctuation.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

#[async_trait]
impl Summarizer for FrequencySummarizer {
    async fn summarize(&self, text: &str) -> Result<SummaryResult, AnalyzerError> {
        let sentences = split_sentences(text);
        if sentences.len() <= self.max_sentences {
            return Ok(SummaryResult {
                summary: sentences.join(" "),
                sentence_count: sentences.len(),
            });
        }

        let frequencies = word_frequencies(text);

        let mut scored: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .map(|(index, sentence)| {
                let words: Vec<String> = sentence
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                    .map(|w| w.to_lowercase())
                    .collect();
                let score = if words.is_empty() {
                    0.0
                } else {
                    let sum: u64 = words
                        .iter()
                        .map(|w| frequencies.get(w).copied().unwrap_or(0))
                        .sum();
                    sum as f64 / words.len() as f64
                };
                (index, score)
            })
            .collect();

        // Highest score wins; earlier sentence wins ties for determinism.
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let mut selected: Vec<usize> = scored
            .into_iter()
            .take(self.max_sentences)
            .map(|(index, _)| index)
            .collect();
        selected.sort_unstable();

        let summary = selected
            .iter()
            .map(|&i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(SummaryResult {
            summary,
            sentence_count: selected.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_short_text_passes_through() {
        let result = FrequencySummarizer::new()
            .summarize("One sentence. Two sentences here.")
            .await
            .unwrap();
        assert_eq!(result.sentence_count, 2);
        assert!(result.summary.contains("One sentence."));
    }

    #[tokio::test]
    async fn test_long_text_is_reduced_in_document_order() {
        let text = "The pipeline caches analysis results by content hash. \
                    Weather was mild on Tuesday. \
                    The cache keys results by content hash and analysis kind. \
                    Someone brought snacks. \
                    Content hash lookups make repeated analysis cheap. \
                    The office plant needs water.";
        let result = FrequencySummarizer::new().summarize(text).await.unwrap();
        assert_eq!(result.sentence_count, 3);

        // Selected sentences keep their original relative order.
        let first = result.summary.find("content hash").unwrap();
        let last = result.summary.rfind("cheap").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_split_sentences_handles_trailing_fragment() {
        let sentences = split_sentences("Complete sentence. Trailing fragment");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1], "Trailing fragment");
    }
}
