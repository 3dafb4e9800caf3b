//! Keyword-evidence document classification.

use async_trait::async_trait;

use crate::models::ClassificationResult;

use super::{AnalyzerError, DocumentClassifier};

/// Document classes with their keyword evidence.
const CLASSES: &[(&str, &[&str])] = &[
    (
        "resume",
        &[
            "resume", "curriculum", "vitae", "experience", "skills", "education", "employment",
            "references", "objective",
        ],
    ),
    (
        "contract",
        &[
            "agreement", "contract", "party", "parties", "hereby", "herein", "thereof",
            "obligations", "termination", "clause", "witnesseth",
        ],
    ),
    (
        "research_paper",
        &[
            "abstract", "introduction", "methodology", "results", "conclusion", "references",
            "hypothesis", "study", "analysis", "literature",
        ],
    ),
    (
        "report",
        &[
            "report", "summary", "findings", "overview", "quarterly", "annual", "assessment",
            "recommendations", "status",
        ],
    ),
    (
        "letter",
        &[
            "dear", "sincerely", "regards", "yours", "faithfully", "writing", "enclosed",
        ],
    ),
    (
        "invoice",
        &[
            "invoice", "amount", "total", "payment", "due", "billed", "quantity", "subtotal",
            "tax",
        ],
    ),
];

/// Classifier scoring keyword hits per document class.
///
/// Confidence is the winning class's share of all keyword evidence; a text
/// with no evidence at all classifies as "unknown" with zero confidence.
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, AnalyzerError> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        let mut scores: Vec<(&str, usize)> = CLASSES
            .iter()
            .map(|(label, keywords)| {
                let hits = words.iter().filter(|w| keywords.contains(&w.as_str())).count();
                (*label, hits)
            })
            .collect();

        let total: usize = scores.iter().map(|(_, hits)| hits).sum();
        if total == 0 {
            return Ok(ClassificationResult {
                label: "unknown".to_string(),
                confidence: 0.0,
            });
        }

        // Stable winner: ties resolve to the class listed first.
        scores.sort_by(|a, b| b.1.cmp(&a.1));
        let (label, hits) = scores[0];

        Ok(ClassificationResult {
            label: label.to_string(),
            confidence: hits as f64 / total as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_contract_language() {
        let result = KeywordClassifier::new()
            .classify(
                "This agreement is made between the parties hereto. The parties hereby \
                 agree to the obligations and termination clause set out herein.",
            )
            .await
            .unwrap();
        assert_eq!(result.label, "contract");
        assert!(result.confidence > 0.5);
    }

    #[tokio::test]
    async fn test_invoice_language() {
        let result = KeywordClassifier::new()
            .classify("Invoice 42: subtotal, tax and total amount due. Payment due in 30 days.")
            .await
            .unwrap();
        assert_eq!(result.label, "invoice");
    }

    #[tokio::test]
    async fn test_no_evidence_is_unknown() {
        let result = KeywordClassifier::new()
            .classify("zz xy qq ww")
            .await
            .unwrap();
        assert_eq!(result.label, "unknown");
        assert_eq!(result.confidence, 0.0);
    }
}
