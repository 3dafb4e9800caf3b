//! Text extraction from documents using pdftotext and Tesseract.
//!
//! Extraction backends are injected into the pipeline behind the
//! `DocumentExtractor` trait so tests can substitute stubs and future
//! engines can slot in without touching orchestration:
//! - `PdftotextExtractor` reads embedded text from PDFs (poppler)
//! - `TesseractExtractor` runs OCR on images and rendered PDF pages

mod pdftotext;
mod tesseract;

pub use pdftotext::PdftotextExtractor;
pub use tesseract::TesseractExtractor;

use std::path::Path;

use thiserror::Error;

use crate::models::ConfidenceMetrics;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of text extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Extracted text content.
    pub text: String,
    /// Quality indicators, when the backend reports them.
    pub confidence: Option<ConfidenceMetrics>,
    /// Number of pages processed (for PDFs).
    pub page_count: Option<u32>,
}

/// A text extraction backend.
pub trait DocumentExtractor: Send + Sync {
    /// Backend name for logging and metrics.
    fn name(&self) -> &'static str;

    /// Extract text from a file based on its MIME type.
    fn extract(&self, path: &Path, mime_type: &str) -> Result<Extraction, ExtractionError>;
}

/// Check whether an external binary is on PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Check if required external tools are available.
pub fn check_tools() -> Vec<(String, bool)> {
    ["pdftotext", "pdftoppm", "pdfinfo", "tesseract"]
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}

/// Handle command output, extracting stdout on success or returning appropriate error.
pub(crate) fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix, stderr
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Check command status, returning appropriate error on failure.
pub(crate) fn check_cmd_status(
    result: std::io::Result<std::process::ExitStatus>,
    tool_name: &str,
    error_msg: &str,
) -> Result<(), ExtractionError> {
    match result {
        Ok(s) if s.success() => Ok(()),
        Ok(_) => Err(ExtractionError::ExtractionFailed(error_msg.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tools() {
        let tools = check_tools();
        assert_eq!(tools.len(), 4);
        assert!(tools.iter().any(|(name, _)| name == "tesseract"));
    }
}
