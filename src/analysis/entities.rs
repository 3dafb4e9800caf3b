//! Regex and capitalization based named entity extraction.

use async_trait::async_trait;
use regex::Regex;

use crate::models::EntitySet;

use super::{AnalyzerError, EntityExtractor};

const ORG_SUFFIXES: &[&str] = &[
    "Inc", "Corp", "LLC", "Ltd", "Company", "Corporation", "University", "Institute",
    "Department", "Agency", "Bureau", "Association", "Foundation", "Bank", "Group",
];

const PERSON_TITLES: &[&str] = &["Mr", "Mrs", "Ms", "Dr", "Prof"];

const KNOWN_LOCATIONS: &[&str] = &[
    "Washington", "London", "Paris", "Berlin", "Tokyo", "Chicago", "Boston", "Seattle",
    "California", "Texas", "Germany", "France", "Japan", "Canada", "Australia", "India",
    "Europe", "America",
];

/// Entity extractor using regexes for structured entities and a
/// capitalized-run heuristic for names.
pub struct RegexEntityExtractor {
    email: Regex,
    phone: Regex,
    capitalized_run: Regex,
}

impl RegexEntityExtractor {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap(),
            phone: Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap(),
            // Runs of 2-4 capitalized words, optionally preceded by a title.
            capitalized_run: Regex::new(
                r"\b(?:(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+)?[A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3}\b",
            )
            .unwrap(),
        }
    }

    /// Bucket a capitalized run as organization, location, or person.
    fn classify_run(run: &str) -> Option<(EntityBucket, String)> {
        let words: Vec<&str> = run.split_whitespace().collect();

        if words
            .iter()
            .any(|w| ORG_SUFFIXES.contains(&w.trim_end_matches('.')))
        {
            return Some((EntityBucket::Organization, run.to_string()));
        }

        if words
            .iter()
            .all(|w| KNOWN_LOCATIONS.contains(&w.trim_end_matches('.')))
        {
            return Some((EntityBucket::Location, run.to_string()));
        }

        let first = words.first()?.trim_end_matches('.');
        if PERSON_TITLES.contains(&first) {
            let name = words[1..].join(" ");
            if name.is_empty() {
                return None;
            }
            return Some((EntityBucket::Person, name));
        }

        // Plain two-word capitalized runs read as personal names.
        if words.len() == 2 {
            return Some((EntityBucket::Person, run.to_string()));
        }

        None
    }
}

enum EntityBucket {
    Person,
    Organization,
    Location,
}

impl Default for RegexEntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityExtractor for RegexEntityExtractor {
    async fn extract(&self, text: &str) -> Result<EntitySet, AnalyzerError> {
        let mut entities = EntitySet::default();

        for m in self.email.find_iter(text) {
            entities.emails.push(m.as_str().to_string());
        }
        for m in self.phone.find_iter(text) {
            entities.phone_numbers.push(m.as_str().trim().to_string());
        }
        for m in self.capitalized_run.find_iter(text) {
            if let Some((bucket, value)) = Self::classify_run(m.as_str()) {
                match bucket {
                    EntityBucket::Person => entities.people.push(value),
                    EntityBucket::Organization => entities.organizations.push(value),
                    EntityBucket::Location => entities.locations.push(value),
                }
            }
        }

        // Deduplicate and sort each bucket so the result is deterministic.
        for bucket in [
            &mut entities.people,
            &mut entities.organizations,
            &mut entities.locations,
            &mut entities.emails,
            &mut entities.phone_numbers,
        ] {
            bucket.sort();
            bucket.dedup();
        }

        Ok(entities)
    }
}
