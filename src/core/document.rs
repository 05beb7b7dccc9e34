//! PDF document ingestion.
//!
//! Text is extracted once per document and cached against a
//! name-plus-size fingerprint; reloading the same file is a no-op.
//! Primary extraction walks pages with `lopdf`, substituting an empty
//! string for pages with no extractable text (scanned images). When the
//! primary pass yields no text at all, a whole-document `pdf-extract`
//! fallback runs.

use std::path::Path;

use lopdf::Document;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to load PDF: {0}")]
    LoadError(String),

    #[error("Failed to extract text: {0}")]
    ExtractionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Not a file: {0}")]
    NotAFile(String),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

// ============================================================================
// Fingerprint
// ============================================================================

/// File-identity fingerprint: `"{file_name}_{byte_size}"`.
///
/// Identity key only, not a content hash.
pub fn fingerprint(path: &Path) -> Result<String> {
    let meta = std::fs::metadata(path)?;
    if !meta.is_file() {
        return Err(DocumentError::NotAFile(path.display().to_string()));
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(format!("{}_{}", name, meta.len()))
}

// ============================================================================
// Extraction
// ============================================================================

/// Seam for text extraction, mockable in tests.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String>;
}

/// PDF text extractor: per-page `lopdf` with `pdf-extract` fallback.
pub struct PdfExtractor;

impl PdfExtractor {
    fn extract_pages(path: &Path) -> Result<String> {
        let doc = Document::load(path).map_err(|e| DocumentError::LoadError(e.to_string()))?;

        let mut text = String::new();
        for (page_num, _page_id) in doc.get_pages() {
            // Pages with no extractable text (scanned images) contribute
            // an empty string instead of failing the whole document.
            match doc.extract_text(&[page_num]) {
                Ok(content) => text.push_str(&content),
                Err(e) => {
                    log::warn!("No text on page {page_num}: {e}");
                }
            }
        }
        Ok(text)
    }

    fn extract_fallback(path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| DocumentError::ExtractionError(format!("pdf-extract failed: {e}")))
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let text = Self::extract_pages(path)?;
        if !text.trim().is_empty() {
            return Ok(text);
        }

        log::info!(
            "lopdf extracted no text from {:?}, trying pdf-extract",
            path.file_name().unwrap_or_default()
        );
        match Self::extract_fallback(path) {
            Ok(fallback) => Ok(fallback),
            Err(e) => {
                // Both passes came up empty: likely a scanned PDF. The
                // document still loads, just with no text to chat over.
                log::warn!("Fallback extraction failed: {e}");
                Ok(text)
            }
        }
    }
}

// ============================================================================
// Document Store
// ============================================================================

/// A loaded document: extracted text keyed by its fingerprint.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub fingerprint: String,
    pub name: String,
    pub text: String,
}

/// Outcome of a load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Fingerprint matched the cached document; extraction skipped.
    AlreadyLoaded,
    /// Fresh extraction ran; reports extracted character count.
    Extracted { chars: usize },
}

/// Holds the current document and gates re-extraction by fingerprint.
pub struct DocumentStore {
    extractor: Box<dyn TextExtractor>,
    current: Option<LoadedDocument>,
}

impl DocumentStore {
    pub fn new(extractor: Box<dyn TextExtractor>) -> Self {
        Self {
            extractor,
            current: None,
        }
    }

    /// Load a PDF. Extraction is invoked only when the fingerprint
    /// differs from the currently loaded document.
    pub fn load(&mut self, path: &Path) -> Result<LoadStatus> {
        let fp = fingerprint(path)?;

        if let Some(ref doc) = self.current {
            if doc.fingerprint == fp {
                log::info!("Document {fp} already loaded, skipping extraction");
                return Ok(LoadStatus::AlreadyLoaded);
            }
        }

        let text = self.extractor.extract(path)?;
        let chars = text.chars().count();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!("Extracted {chars} chars from {name}");

        self.current = Some(LoadedDocument {
            fingerprint: fp,
            name,
            text,
        });
        Ok(LoadStatus::Extracted { chars })
    }

    pub fn current(&self) -> Option<&LoadedDocument> {
        self.current.as_ref()
    }

    /// Document text, empty when nothing is loaded.
    pub fn text(&self) -> &str {
        self.current.as_ref().map(|d| d.text.as_str()).unwrap_or("")
    }

    /// True when a document with non-empty text is loaded.
    pub fn has_text(&self) -> bool {
        self.current
            .as_ref()
            .map(|d| !d.text.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingExtractor {
        calls: Arc<AtomicUsize>,
        text: String,
    }

    impl TextExtractor for CountingExtractor {
        fn extract(&self, _path: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_fingerprint_is_name_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "paper.pdf", b"12345");
        assert_eq!(fingerprint(&path).unwrap(), "paper.pdf_5");
    }

    #[test]
    fn test_fingerprint_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(fingerprint(&dir.path().join("nope.pdf")).is_err());
    }

    #[test]
    fn test_same_fingerprint_extracts_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "doc.pdf", b"content");

        let calls = Arc::new(AtomicUsize::new(0));
        let mut store = DocumentStore::new(Box::new(CountingExtractor {
            calls: calls.clone(),
            text: "hello".to_string(),
        }));

        assert_eq!(
            store.load(&path).unwrap(),
            LoadStatus::Extracted { chars: 5 }
        );
        assert_eq!(store.load(&path).unwrap(), LoadStatus::AlreadyLoaded);
        assert_eq!(store.load(&path).unwrap(), LoadStatus::AlreadyLoaded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_changed_fingerprint_re_extracts() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_temp(&dir, "a.pdf", b"one");
        let second = write_temp(&dir, "b.pdf", b"two");

        let calls = Arc::new(AtomicUsize::new(0));
        let mut store = DocumentStore::new(Box::new(CountingExtractor {
            calls: calls.clone(),
            text: "t".to_string(),
        }));

        store.load(&first).unwrap();
        store.load(&second).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.current().unwrap().name, "b.pdf");
    }

    #[test]
    fn test_has_text_false_for_whitespace_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "scan.pdf", b"img");

        let mut store = DocumentStore::new(Box::new(CountingExtractor {
            calls: Arc::new(AtomicUsize::new(0)),
            text: "   \n".to_string(),
        }));
        store.load(&path).unwrap();
        assert!(!store.has_text());
        assert!(store.current().is_some());
    }

    #[test]
    fn test_load_malformed_pdf_propagates_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "broken.pdf", b"not a pdf at all");

        let mut store = DocumentStore::new(Box::new(PdfExtractor));
        assert!(store.load(&path).is_err());
        assert!(store.current().is_none());
    }
}
