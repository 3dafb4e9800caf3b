//! Storage helpers for uploaded document content on disk.

use std::path::{Path, PathBuf};

/// Construct the storage path for document content.
///
/// Uses a two-level directory structure based on hash prefix for filesystem
/// efficiency: `{documents_dir}/{hash[0..2]}/{hash[0..8]}.{extension}`
pub fn content_storage_path(documents_dir: &Path, content_hash: &str, extension: &str) -> PathBuf {
    documents_dir
        .join(&content_hash[..2])
        .join(format!("{}.{}", &content_hash[..8], extension))
}

/// Map MIME type to file extension.
pub fn mime_to_extension(mime: &str) -> &'static str {
    match mime {
        "application/pdf" => "pdf",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/tiff" => "tif",
        _ => "bin",
    }
}

/// Save uploaded content to its hash-addressed path.
///
/// Returns the path where the content was saved. Writing the same content
/// twice is a no-op overwrite of identical bytes.
pub fn save_content(
    content: &[u8],
    content_hash: &str,
    mime_type: &str,
    documents_dir: &Path,
) -> std::io::Result<PathBuf> {
    let content_path =
        content_storage_path(documents_dir, content_hash, mime_to_extension(mime_type));

    if let Some(parent) = content_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&content_path, content)?;

    Ok(content_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content_hash;
    use tempfile::tempdir;

    #[test]
    fn test_content_storage_path() {
        let docs_dir = Path::new("/docs");
        let hash = "abcdef1234567890abcdef1234567890";
        let path = content_storage_path(docs_dir, hash, "pdf");
        assert_eq!(path, PathBuf::from("/docs/ab/abcdef12.pdf"));
    }

    #[test]
    fn test_mime_to_extension() {
        assert_eq!(mime_to_extension("application/pdf"), "pdf");
        assert_eq!(mime_to_extension("image/jpeg"), "jpg");
        assert_eq!(mime_to_extension("image/png"), "png");
        assert_eq!(mime_to_extension("image/tiff"), "tif");
        assert_eq!(mime_to_extension("application/unknown"), "bin");
    }

    #[test]
    fn test_save_content() {
        let dir = tempdir().unwrap();
        let content = b"test document content";
        let hash = content_hash(content);

        let path = save_content(content, &hash, "application/pdf", dir.path()).unwrap();

        assert!(path.exists());
        let saved = std::fs::read(&path).unwrap();
        assert_eq!(saved, content);

        // Hash-based subdirectory with a 2-char prefix.
        let parent_name = path
            .parent()
            .unwrap()
            .file_name()
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(parent_name, &hash[..2]);
    }
}
