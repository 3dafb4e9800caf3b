//! Tesseract OCR extraction backend.
//!
//! Uses Tesseract via command-line in TSV mode so per-word confidences can
//! be aggregated into the confidence metrics stored with the cache entry.
//! PDFs are rendered page-by-page with pdftoppm before OCR.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::models::{ConfidenceMetrics, ConfidenceStats};

use super::{check_cmd_status, DocumentExtractor, Extraction, ExtractionError};

/// OCR extraction backend backed by the system `tesseract` binary.
pub struct TesseractExtractor {
    language: String,
}

impl TesseractExtractor {
    pub fn new() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }

    /// Set the Tesseract language (e.g. "eng", "deu").
    pub fn with_language(mut self, lang: &str) -> Self {
        self.language = lang.to_string();
        self
    }

    /// Run Tesseract in TSV mode and parse text plus word confidences.
    fn ocr_image(&self, image_path: &Path) -> Result<(String, Vec<f64>), ExtractionError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language, "tsv"])
            .output();

        let tsv = super::handle_cmd_output(
            output,
            "tesseract (install tesseract-ocr)",
            "tesseract failed",
        )?;

        Ok(parse_tsv(&tsv))
    }

    /// Convert one PDF page to an image with pdftoppm.
    fn pdf_page_to_image(
        &self,
        pdf_path: &Path,
        page: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, ExtractionError> {
        let page_str = page.to_string();
        let status = Command::new("pdftoppm")
            .args(["-png", "-r", "300", "-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg(output_dir.join("page"))
            .status();

        check_cmd_status(
            status,
            "pdftoppm (install poppler-utils)",
            &format!("pdftoppm failed to convert page {}", page),
        )?;

        find_page_image(output_dir, page).ok_or_else(|| {
            ExtractionError::ExtractionFailed(format!("No image generated for page {}", page))
        })
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

    /// OCR every page of a PDF, combining text and confidences.
    fn ocr_pdf(&self, pdf_path: &Path) -> Result<Extraction, ExtractionError> {
        let page_count = self.pdf_page_count(pdf_path).unwrap_or(1);
        let temp_dir = TempDir::new()?;

        let mut page_texts = Vec::with_capacity(page_count as usize);
        let mut all_confidences = Vec::new();

        for page in 1..=page_count {
            let image_path = self.pdf_page_to_image(pdf_path, page, temp_dir.path())?;
            match self.ocr_image(&image_path) {
                Ok((text, confidences)) => {
                    page_texts.push(text);
                    all_confidences.extend(confidences);
                }
                Err(e) => {
                    tracing::warn!("OCR failed for page {}: {}", page, e);
                }
            }
        }

        if page_texts.is_empty() {
            return Err(ExtractionError::ExtractionFailed(
                "OCR produced no pages".to_string(),
            ));
        }

        Ok(Extraction {
            text: page_texts.join("\n\n"),
            confidence: confidence_metrics(&all_confidences),
            page_count: Some(page_count),
        })
    }
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for TesseractExtractor {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn extract(&self, path: &Path, mime_type: &str) -> Result<Extraction, ExtractionError> {
        match mime_type {
            "application/pdf" => self.ocr_pdf(path),
            "image/png" | "image/jpeg" | "image/tiff" => {
                let (text, confidences) = self.ocr_image(path)?;
                Ok(Extraction {
                    text,
                    confidence: confidence_metrics(&confidences),
                    page_count: Some(1),
                })
            }
            other => Err(ExtractionError::UnsupportedFileType(other.to_string())),
        }
    }
}

/// Find the image file for a specific page number.
/// pdftoppm names files like page-01.png; wide documents use more digits.
fn find_page_image(temp_path: &Path, page_num: u32) -> Option<PathBuf> {
    for digits in [1, 2, 3, 4] {
        let filename = format!("page-{:0width$}.png", page_num, width = digits);
        let path = temp_path.join(&filename);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Parse Tesseract TSV output into text and per-word confidences in [0, 1].
///
/// TSV columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Rows with conf -1 are layout rows.
fn parse_tsv(tsv: &str) -> (String, Vec<f64>) {
    let mut words: Vec<String> = Vec::new();
    let mut confidences = Vec::new();
    let mut last_line_key: Option<(u32, u32, u32)> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }

        let conf: f64 = match cols[10].parse() {
            Ok(c) => c,
            Err(_) => continue,
        };
        let word = cols[11].trim();
        if conf < 0.0 || word.is_empty() {
            continue;
        }

        let line_key = (
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        if last_line_key.is_some() && last_line_key != Some(line_key) {
            if let Some(last) = words.last_mut() {
                last.push('\n');
            }
        }
        last_line_key = Some(line_key);

        words.push(word.to_string());
        confidences.push(conf / 100.0);
    }

    let mut text = String::new();
    for word in &words {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push(' ');
        }
        text.push_str(word);
    }

    (text, confidences)
}

/// Aggregate word confidences into metrics; None if no words were read.
fn confidence_metrics(confidences: &[f64]) -> Option<ConfidenceMetrics> {
    if confidences.is_empty() {
        return None;
    }
    let sum: f64 = confidences.iter().sum();
    let average = sum / confidences.len() as f64;
    let min = confidences.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = confidences.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Some(ConfidenceMetrics {
        overall_confidence: average,
        character_confidence: Some(ConfidenceStats { average, min, max }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
        1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t\n\
        5\t1\t1\t1\t1\t1\t5\t5\t20\t10\t96\tHello\n\
        5\t1\t1\t1\t1\t2\t30\t5\t20\t10\t88\tworld\n\
        5\t1\t1\t1\t2\t1\t5\t20\t20\t10\t72\tagain\n";

    #[test]
    fn test_parse_tsv_words_and_confidences() {
        let (text, confidences) = parse_tsv(SAMPLE_TSV);
        assert_eq!(text, "Hello world\nagain");
        assert_eq!(confidences, vec![0.96, 0.88, 0.72]);
    }

    #[test]
    fn test_parse_tsv_skips_layout_rows() {
        let (_, confidences) = parse_tsv(SAMPLE_TSV);
        // The conf=-1 layout row contributes nothing.
        assert_eq!(confidences.len(), 3);
    }

    #[test]
    fn test_confidence_metrics_aggregation() {
        let metrics = confidence_metrics(&[0.9, 0.8, 0.7]).unwrap();
        assert!((metrics.overall_confidence - 0.8).abs() < 1e-9);
        let stats = metrics.character_confidence.unwrap();
        assert!((stats.min - 0.7).abs() < 1e-9);
        assert!((stats.max - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_metrics_empty() {
        assert!(confidence_metrics(&[]).is_none());
    }

    #[test]
    fn test_unsupported_mime_rejected() {
        let extractor = TesseractExtractor::new();
        let err = extractor
            .extract(Path::new("/tmp/file.gif"), "image/gif")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFileType(_)));
    }
}
