//! MIME type validation and content sniffing.

use std::path::Path;

/// MIME types the pipeline accepts.
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/tiff",
];

/// Whether a declared MIME type is one the pipeline can process.
pub fn is_supported(mime: &str) -> bool {
    SUPPORTED_MIME_TYPES.contains(&normalize(mime).as_str())
}

/// Normalize a MIME type for comparison (strip parameters, lowercase).
pub fn normalize(mime: &str) -> String {
    mime.split(';').next().unwrap_or(mime).trim().to_lowercase()
}

/// Guess a MIME type from a filename extension.
pub fn from_filename(filename: &str) -> Option<String> {
    mime_guess::from_path(Path::new(filename))
        .first_raw()
        .map(|m| m.to_string())
}

/// Detect the MIME type from magic bytes and check it against the declared
/// type. Returns `Some((detected, declared))` when they differ meaningfully,
/// `None` when they match or the content is unrecognizable.
pub fn detect_mime_mismatch(content: &[u8], declared: &str) -> Option<(String, String)> {
    let detected = infer::get(content)?;
    let detected_mime = detected.mime_type();
    let declared_normalized = normalize(declared);

    if detected_mime == declared_normalized {
        return None;
    }

    // jpeg/jpg and similar aliases share a type family; only report
    // mismatches that cross families or change the processing path.
    let declared_base = declared_normalized.split('/').next().unwrap_or("");
    let detected_base = detected_mime.split('/').next().unwrap_or("");

    if declared_base != detected_base || is_supported(detected_mime) {
        return Some((detected_mime.to_string(), declared_normalized));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal valid PNG header.
    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_supported_types() {
        assert!(is_supported("application/pdf"));
        assert!(is_supported("image/png"));
        assert!(is_supported("IMAGE/PNG; charset=binary"));
        assert!(!is_supported("text/html"));
        assert!(!is_supported("application/zip"));
    }

    #[test]
    fn test_from_filename() {
        assert_eq!(from_filename("scan.png").as_deref(), Some("image/png"));
        assert_eq!(from_filename("doc.pdf").as_deref(), Some("application/pdf"));
        assert_eq!(from_filename("noext"), None);
    }

    #[test]
    fn test_mismatch_detected_for_wrong_declaration() {
        let mismatch = detect_mime_mismatch(PNG_MAGIC, "application/pdf");
        assert_eq!(
            mismatch,
            Some(("image/png".to_string(), "application/pdf".to_string()))
        );
    }

    #[test]
    fn test_matching_declaration_passes() {
        assert_eq!(detect_mime_mismatch(PNG_MAGIC, "image/png"), None);
    }

    #[test]
    fn test_unrecognizable_content_passes() {
        assert_eq!(detect_mime_mismatch(b"plain words", "application/pdf"), None);
    }
}
