//! Basic text statistics attached to pipeline results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const STOPWORDS: &[&str] = &[
    "the", "and", "to", "of", "a", "in", "for", "is", "on", "that", "by", "this", "with", "be",
    "are", "as", "an", "it", "not", "or", "from", "at", "was", "but", "have", "you",
];

const TOP_WORD_COUNT: usize = 10;
const MIN_WORD_LENGTH: usize = 3;

/// One entry in the top-words list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Basic statistics for a block of extracted text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    pub characters: u64,
    pub characters_no_spaces: u64,
    pub words: u64,
    pub sentences: u64,
    pub paragraphs: u64,
    pub top_words: Vec<WordCount>,
}

impl TextStats {
    pub fn from_text(text: &str) -> Self {
        let characters = text.chars().count() as u64;
        let characters_no_spaces = text.chars().filter(|c| !c.is_whitespace()).count() as u64;

        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .count() as u64;

        let sentences = text
            .split(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .count() as u64;

        let paragraphs = text
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count() as u64;

        Self {
            characters,
            characters_no_spaces,
            words,
            sentences,
            paragraphs,
            top_words: top_words(text),
        }
    }
}

/// Frequency of content words (lowercased, stop words and short words
/// removed). Shared by the stats and the summarizer scoring.
pub fn word_frequencies(text: &str) -> HashMap<String, u64> {
    let mut frequencies = HashMap::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let lower = word.to_lowercase();
        if lower.len() < MIN_WORD_LENGTH || STOPWORDS.contains(&lower.as_str()) {
            continue;
        }
        *frequencies.entry(lower).or_insert(0) += 1;
    }
    frequencies
}

/// Most frequent content words; count descending, then alphabetical so the
/// output is deterministic.
fn top_words(text: &str) -> Vec<WordCount> {
    let mut counts: Vec<WordCount> = word_frequencies(text)
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.word.cmp(&b.word)));
    counts.truncate(TOP_WORD_COUNT);
    counts
}
