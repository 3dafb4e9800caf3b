//! Direct text extraction backend.
//!
//! Reads embedded text from PDFs with pdftotext. Digital text needs no OCR,
//! so it carries a fixed high confidence. Image uploads have no embedded
//! text layer and delegate to the OCR backend.

use std::path::Path;
use std::process::Command;

use crate::models::ConfidenceMetrics;

use super::{DocumentExtractor, Extraction, ExtractionError, TesseractExtractor};

/// Text extraction backend backed by poppler's `pdftotext`.
pub struct PdftotextExtractor {
    ocr_fallback: TesseractExtractor,
}

impl PdftotextExtractor {
    pub fn new() -> Self {
        Self {
            ocr_fallback: TesseractExtractor::new(),
        }
    }

    /// Set the OCR language used for image uploads.
    pub fn with_language(mut self, lang: &str) -> Self {
        self.ocr_fallback = TesseractExtractor::new().with_language(lang);
        self
    }

    /// Run pdftotext on a PDF file.
    fn run_pdftotext(&self, pdf_path: &Path) -> Result<String, ExtractionError> {
        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8"])
            .arg(pdf_path)
            .arg("-") // Output to stdout
            .output();

        super::handle_cmd_output(output, "pdftotext (install poppler-utils)", "pdftotext failed")
    }

    /// Get the page count of a PDF.
    fn pdf_page_count(&self, pdf_path: &Path) -> Option<u32> {
        let output = Command::new("pdfinfo").arg(pdf_path).output().ok()?;

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            if line.starts_with("Pages:") {
                return line.split_whitespace().nth(1).and_then(|s| s.parse().ok());
            }
        }
        None
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for PdftotextExtractor {
    fn name(&self) -> &'static str {
        "pdftotext"
    }

    fn extract(&self, path: &Path, mime_type: &str) -> Result<Extraction, ExtractionError> {
        match mime_type {
            "application/pdf" => {
                let text = self.run_pdftotext(path)?;
                let confidence = if text.trim().is_empty() {
                    None
                } else {
                    Some(ConfidenceMetrics::digital_text())
                };
                Ok(Extraction {
                    text,
                    confidence,
                    page_count: self.pdf_page_count(path),
                })
            }
            // Images have no embedded text layer; OCR is the only reading.
            "image/png" | "image/jpeg" | "image/tiff" => self.ocr_fallback.extract(path, mime_type),
            other => Err(ExtractionError::UnsupportedFileType(other.to_string())),
        }
    }
}
